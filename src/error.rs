use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("reading {range} failed with HTTP status {status}")]
    RemoteRead { range: String, status: u16 },
    #[error("transport error while reading {range}: {message}")]
    Transport { range: String, message: String },
    #[error("malformed values payload for {range}: {message}")]
    Decode { range: String, message: String },
}

impl SheetsError {
    pub fn code(&self) -> &'static str {
        match self {
            SheetsError::RemoteRead { .. } => "sheets_remote_read",
            SheetsError::Transport { .. } => "sheets_transport",
            SheetsError::Decode { .. } => "sheets_decode",
        }
    }
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("network error calling {action}: {message}")]
    Network { action: String, message: String },
    #[error("{action} timed out after {after:?}")]
    Timeout { action: String, after: Duration },
    #[error("{action} failed: {message}")]
    Application { action: String, message: String },
    #[error("malformed response to {action}: {message}")]
    Protocol { action: String, message: String },
    #[error("cannot build request for {action}: {message}")]
    BadRequest { action: String, message: String },
}

impl RpcError {
    pub fn code(&self) -> &'static str {
        match self {
            RpcError::Network { .. } => "rpc_network",
            RpcError::Timeout { .. } => "rpc_timeout",
            RpcError::Application { .. } => "rpc_application",
            RpcError::Protocol { .. } => "rpc_protocol",
            RpcError::BadRequest { .. } => "rpc_bad_request",
        }
    }
}
