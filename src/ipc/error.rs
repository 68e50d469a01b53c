use crate::error::{RpcError, SheetsError};
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn sheets_err(id: &str, e: &SheetsError) -> serde_json::Value {
    let details = match e {
        SheetsError::RemoteRead { range, status } => json!({ "range": range, "status": status }),
        SheetsError::Transport { range, .. } | SheetsError::Decode { range, .. } => {
            json!({ "range": range })
        }
    };
    err(id, e.code(), e.to_string(), Some(details))
}

pub fn rpc_err(id: &str, e: &RpcError) -> serde_json::Value {
    let details = match e {
        RpcError::Timeout { action, after } => {
            json!({ "action": action, "timeoutMs": after.as_millis() as u64 })
        }
        RpcError::Network { action, .. }
        | RpcError::Application { action, .. }
        | RpcError::Protocol { action, .. }
        | RpcError::BadRequest { action, .. } => json!({ "action": action }),
    };
    err(id, e.code(), e.to_string(), Some(details))
}
