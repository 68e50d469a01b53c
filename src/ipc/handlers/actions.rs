use crate::ipc::error::{err, ok, rpc_err};
use crate::ipc::types::{AppState, Dispatch, Request};
use crate::rpc::CallOptions;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// `timeoutMs` absent keeps the channel default; `null` or 0 means untimed.
fn call_options(defaults: CallOptions, params: &serde_json::Value) -> Result<CallOptions, String> {
    let mut opts = defaults;
    match params.get("timeoutMs") {
        None => {}
        Some(serde_json::Value::Null) => opts.timeout = None,
        Some(v) => match v.as_u64() {
            Some(0) => opts.timeout = None,
            Some(ms) => opts.timeout = Some(Duration::from_millis(ms)),
            None => return Err("timeoutMs must be a non-negative integer or null".to_string()),
        },
    }
    match params.get("rejectOnFailure") {
        None | Some(serde_json::Value::Null) => {}
        Some(v) => {
            opts.reject_on_failure = v
                .as_bool()
                .ok_or_else(|| "rejectOnFailure must be a boolean".to_string())?
        }
    }
    Ok(opts)
}

fn handle_actions_call(state: &mut AppState, req: &Request) -> Dispatch {
    let Some(services) = state.services.as_ref().map(Arc::clone) else {
        return Dispatch::Reply(err(&req.id, "no_config", "load a configuration first", None));
    };

    let action = match req.params.get("action").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return Dispatch::Reply(err(&req.id, "bad_params", "missing action", None)),
    };
    let params = match req.params.get("params") {
        None | Some(serde_json::Value::Null) => serde_json::Map::new(),
        Some(serde_json::Value::Object(m)) => m.clone(),
        Some(_) => {
            return Dispatch::Reply(err(&req.id, "bad_params", "params must be an object", None))
        }
    };
    let opts = match call_options(services.rpc.defaults(), &req.params) {
        Ok(o) => o,
        Err(msg) => return Dispatch::Reply(err(&req.id, "bad_params", msg, None)),
    };

    let id = req.id.clone();
    Dispatch::deferred(move || match services.rpc.call_with(&action, &params, opts) {
        Ok(resp) => {
            let outcome = resp.outcome();
            ok(
                &id,
                json!({
                    "response": resp.payload(),
                    "outcome": outcome,
                }),
            )
        }
        Err(e) => rpc_err(&id, &e),
    })
}

fn handle_actions_pending(state: &mut AppState, req: &Request) -> serde_json::Value {
    let callbacks = state
        .services
        .as_ref()
        .map(|s| s.rpc.pending())
        .unwrap_or_default();
    ok(&req.id, json!({ "callbacks": callbacks }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Dispatch> {
    match req.method.as_str() {
        "actions.call" => Some(handle_actions_call(state, req)),
        "actions.pending" => Some(Dispatch::Reply(handle_actions_pending(state, req))),
        _ => None,
    }
}
