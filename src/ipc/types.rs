use crate::config::Config;
use crate::rpc::RpcChannel;
use crate::sheets::TabularStore;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything built from a loaded config file.
pub struct Services {
    pub config_path: PathBuf,
    pub config: Config,
    pub store: TabularStore,
    pub rpc: RpcChannel,
}

#[derive(Default)]
pub struct AppState {
    pub services: Option<Arc<Services>>,
}

/// Work that produces its reply off the request loop.
pub type Job = Box<dyn FnOnce() -> serde_json::Value + Send + 'static>;

/// How a request gets answered: right away, or by a job that may block on
/// the network.
pub enum Dispatch {
    Reply(serde_json::Value),
    Deferred(Job),
}

impl Dispatch {
    pub fn deferred<F>(f: F) -> Self
    where
        F: FnOnce() -> serde_json::Value + Send + 'static,
    {
        Dispatch::Deferred(Box::new(f))
    }
}
