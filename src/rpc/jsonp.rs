use crate::rpc::registry::CallbackRegistry;
use serde_json::{Map, Value};

/// Query-string form of one action parameter. Objects and arrays travel as
/// JSON text.
pub fn param_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => v.to_string(),
    }
}

/// `endpoint?action=..&<params>&callback=<id>`.
pub fn call_url(
    endpoint: &str,
    action: &str,
    params: &Map<String, Value>,
    callback: &str,
) -> Result<url::Url, url::ParseError> {
    let mut url = url::Url::parse(endpoint)?;
    {
        let mut q = url.query_pairs_mut();
        q.append_pair("action", action);
        for (k, v) in params {
            q.append_pair(k, &param_text(v));
        }
        q.append_pair("callback", callback);
    }
    Ok(url)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCall {
    pub callback: String,
    pub payload: Value,
}

/// Parses a reply of the form `name(<json>);`, optionally prefixed with
/// `/**/` or `window.`.
pub fn parse_script(body: &str) -> Result<ScriptCall, String> {
    let mut s = body.trim();
    while let Some(rest) = s.strip_prefix("/*") {
        let Some(end) = rest.find("*/") else {
            return Err("unterminated comment".to_string());
        };
        s = rest[end + 2..].trim_start();
    }
    let s = s.trim_end().trim_end_matches(';').trim_end();

    let open = s
        .find('(')
        .ok_or_else(|| "reply does not call a function".to_string())?;
    if !s.ends_with(')') {
        return Err("reply call is not closed".to_string());
    }
    let name = s[..open].trim();
    let name = name.strip_prefix("window.").unwrap_or(name);
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if !valid_name {
        return Err(format!("invalid callback name: {name:?}"));
    }

    let args = s[open + 1..s.len() - 1].trim();
    let payload = if args.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(args).map_err(|e| format!("callback argument is not JSON: {e}"))?
    };
    Ok(ScriptCall {
        callback: name.to_string(),
        payload,
    })
}

/// Runs a reply script against the registry. Returns the callback it invoked.
pub fn run_script(body: &str, registry: &CallbackRegistry) -> Result<String, String> {
    let call = parse_script(body)?;
    registry.invoke(&call.callback, call.payload);
    Ok(call.callback)
}
