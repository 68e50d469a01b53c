use std::time::Duration;

/// What a loaded reply hands back to the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Script text expected to call the request's callback.
    Script(String),
    /// Payload addressed to the request's own callback.
    Payload(serde_json::Value),
}

/// Loads one action URL. An `Err` is a load failure (the script-tag `onerror`
/// case), carrying a human-readable reason.
///
/// `timeout` bounds the whole load. `None` lets it run as long as the
/// endpoint keeps the connection open.
pub trait RpcTransport: Send + Sync {
    fn load(&self, url: &url::Url, timeout: Option<Duration>) -> Result<Reply, String>;
}

fn agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build();
    ureq::Agent::new_with_config(config)
}

fn get_text(
    agent: &ureq::Agent,
    url: &url::Url,
    timeout: Option<Duration>,
) -> Result<String, String> {
    let mut resp = agent
        .get(url.as_str())
        .config()
        .timeout_global(timeout)
        .build()
        .call()
        .map_err(|e| e.to_string())?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("HTTP status {}", status.as_u16()));
    }
    resp.body_mut()
        .read_to_string()
        .map_err(|e| format!("failed to read body: {e}"))
}

/// JSONP: the endpoint answers with `callback(payload)`.
pub struct ScriptTransport {
    agent: ureq::Agent,
}

impl ScriptTransport {
    pub fn new() -> Self {
        Self { agent: agent() }
    }
}

impl Default for ScriptTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcTransport for ScriptTransport {
    fn load(&self, url: &url::Url, timeout: Option<Duration>) -> Result<Reply, String> {
        get_text(&self.agent, url, timeout).map(Reply::Script)
    }
}

/// Plain GET for endpoints that allow cross-origin reads and answer with JSON.
/// A body that is not JSON is handed on as script.
pub struct FetchTransport {
    agent: ureq::Agent,
}

impl FetchTransport {
    pub fn new() -> Self {
        Self { agent: agent() }
    }
}

impl Default for FetchTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcTransport for FetchTransport {
    fn load(&self, url: &url::Url, timeout: Option<Duration>) -> Result<Reply, String> {
        let body = get_text(&self.agent, url, timeout)?;
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(v) => Ok(Reply::Payload(v)),
            Err(_) => Ok(Reply::Script(body)),
        }
    }
}
