pub mod jsonp;
mod registry;
mod response;
mod transport;

pub use registry::CallbackRegistry;
pub use response::{ActionOutcome, ActionResponse};
pub use transport::{FetchTransport, Reply, RpcTransport, ScriptTransport};

use crate::config::{Config, RpcTransportKind, DEFAULT_RPC_TIMEOUT_SECS};
use crate::error::RpcError;
use registry::Settlement;
use serde_json::{Map, Value};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS);

/// Extra time a loader gets past the call timer before its request is cut.
pub const LOADER_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    /// `None` waits until the transport settles the call, however long that is.
    pub timeout: Option<Duration>,
    /// Turn `success: false` replies into `RpcError::Application`.
    pub reject_on_failure: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_CALL_TIMEOUT),
            reject_on_failure: false,
        }
    }
}

impl CallOptions {
    pub fn untimed() -> Self {
        Self {
            timeout: None,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn rejecting_failures(mut self) -> Self {
        self.reject_on_failure = true;
        self
    }
}

/// One-shot action calls against the remote endpoint.
///
/// Every call registers its own callback name, loads the request on a separate
/// thread and waits for the reply to invoke that callback. Calls are
/// independent: no ordering, no retries, no cancellation.
pub struct RpcChannel {
    endpoint: String,
    transport: Arc<dyn RpcTransport>,
    registry: Arc<CallbackRegistry>,
    defaults: CallOptions,
}

impl RpcChannel {
    pub fn new(endpoint: impl Into<String>, transport: impl RpcTransport + 'static) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: Arc::new(transport),
            registry: Arc::new(CallbackRegistry::new()),
            defaults: CallOptions::default(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let channel = match cfg.rpc_transport {
            RpcTransportKind::Jsonp => Self::new(cfg.rpc_url.clone(), ScriptTransport::new()),
            RpcTransportKind::Fetch => Self::new(cfg.rpc_url.clone(), FetchTransport::new()),
        };
        channel.with_defaults(CallOptions {
            timeout: cfg.rpc_timeout(),
            reject_on_failure: false,
        })
    }

    pub fn with_defaults(mut self, defaults: CallOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn defaults(&self) -> CallOptions {
        self.defaults
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    /// Callback names of calls still waiting for a reply.
    pub fn pending(&self) -> Vec<String> {
        self.registry.registered()
    }

    pub fn call(
        &self,
        action: &str,
        params: &Map<String, Value>,
    ) -> Result<ActionResponse, RpcError> {
        self.call_with(action, params, self.defaults)
    }

    /// Like `call`, but always rejects `success: false` and returns the reply data.
    pub fn call_checked(
        &self,
        action: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, RpcError> {
        let resp = self.call_with(action, params, self.defaults.rejecting_failures())?;
        match resp.outcome() {
            ActionOutcome::Ok { data } => Ok(data),
            ActionOutcome::Err { message } => Err(RpcError::Application {
                action: action.to_string(),
                message,
            }),
        }
    }

    pub fn call_with(
        &self,
        action: &str,
        params: &Map<String, Value>,
        options: CallOptions,
    ) -> Result<ActionResponse, RpcError> {
        let (callback, rx) = self.registry.register();

        let url = match jsonp::call_url(&self.endpoint, action, params, &callback) {
            Ok(u) => u,
            Err(e) => {
                self.registry.deregister(&callback);
                return Err(RpcError::BadRequest {
                    action: action.to_string(),
                    message: e.to_string(),
                });
            }
        };

        tracing::debug!(action, callback = %callback, "issuing action call");
        let loader = {
            let transport = Arc::clone(&self.transport);
            let registry = Arc::clone(&self.registry);
            let callback = callback.clone();
            let load_timeout = options.timeout.map(|t| t.saturating_add(LOADER_GRACE));
            thread::Builder::new()
                .name("rpc-loader".to_string())
                .spawn(move || {
                    load_reply(transport.as_ref(), &registry, &url, &callback, load_timeout)
                })
        };
        let loader = match loader {
            Ok(h) => h,
            Err(e) => {
                self.registry.deregister(&callback);
                return Err(RpcError::Network {
                    action: action.to_string(),
                    message: format!("failed to start loader: {e}"),
                });
            }
        };

        let settled = match options.timeout {
            Some(after) => match rx.recv_timeout(after) {
                Ok(s) => Some(s),
                Err(RecvTimeoutError::Timeout) => {
                    match settle_after_timeout(&self.registry, &callback, &rx) {
                        Some(s) => Some(s),
                        None => {
                            tracing::warn!(action, callback = %callback, ?after, "action call timed out");
                            // The loader keeps running; a late reply finds no callback.
                            return Err(RpcError::Timeout {
                                action: action.to_string(),
                                after,
                            });
                        }
                    }
                }
                Err(RecvTimeoutError::Disconnected) => None,
            },
            None => rx.recv().ok(),
        };
        let _ = loader.join();

        match settled {
            Some(Settlement::Resolved(payload)) => {
                let resp = ActionResponse::new(payload);
                if options.reject_on_failure && !resp.succeeded() {
                    if let ActionOutcome::Err { message } = resp.outcome() {
                        return Err(RpcError::Application {
                            action: action.to_string(),
                            message,
                        });
                    }
                }
                Ok(resp)
            }
            Some(Settlement::Failed(message)) => Err(RpcError::Network {
                action: action.to_string(),
                message,
            }),
            Some(Settlement::Unanswered(message)) => Err(RpcError::Protocol {
                action: action.to_string(),
                message,
            }),
            None => {
                self.registry.deregister(&callback);
                Err(RpcError::Network {
                    action: action.to_string(),
                    message: "call abandoned before a reply arrived".to_string(),
                })
            }
        }
    }
}

/// Called once the call timer has fired. Removing the slot makes the timeout
/// final; if a settler already took the slot, its message is on the way and
/// wins instead.
fn settle_after_timeout(
    registry: &CallbackRegistry,
    callback: &str,
    rx: &Receiver<Settlement>,
) -> Option<Settlement> {
    if registry.deregister(callback) {
        return None;
    }
    rx.recv().ok()
}

/// Fails the call's slot if the loader exits (or unwinds) without settling it.
struct SettleOnExit<'a> {
    registry: &'a CallbackRegistry,
    callback: &'a str,
}

impl Drop for SettleOnExit<'_> {
    fn drop(&mut self) {
        let settled = self.registry.settle(
            self.callback,
            Settlement::Failed("loader ended without a reply".to_string()),
        );
        if settled {
            tracing::error!(callback = self.callback, "action loader ended without settling");
        }
    }
}

/// Loader body: fetch the reply and settle the call through the registry.
fn load_reply(
    transport: &dyn RpcTransport,
    registry: &CallbackRegistry,
    url: &url::Url,
    callback: &str,
    timeout: Option<Duration>,
) {
    let _guard = SettleOnExit { registry, callback };
    match transport.load(url, timeout) {
        Ok(Reply::Payload(v)) => {
            registry.invoke(callback, v);
        }
        Ok(Reply::Script(body)) => {
            if let Err(e) = jsonp::run_script(&body, registry) {
                tracing::warn!(callback, error = %e, "reply script did not run");
            }
            // A script that ran without calling us leaves the slot behind.
            if registry.is_registered(callback) {
                registry.settle(
                    callback,
                    Settlement::Unanswered("reply did not invoke the call's callback".to_string()),
                );
            }
        }
        Err(message) => {
            registry.settle(callback, Settlement::Failed(message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timeout_with_reply_already_claimed_resolves() {
        let reg = CallbackRegistry::new();
        let (id, rx) = reg.register();
        // Reply lands after the timer fired but before the slot is removed.
        assert!(reg.invoke(&id, json!({ "success": true })));
        match settle_after_timeout(&reg, &id, &rx) {
            Some(Settlement::Resolved(v)) => assert_eq!(v, json!({ "success": true })),
            other => panic!("expected resolved settlement, got {other:?}"),
        }
    }

    #[test]
    fn timeout_with_slot_still_registered_is_final() {
        let reg = CallbackRegistry::new();
        let (id, rx) = reg.register();
        assert!(settle_after_timeout(&reg, &id, &rx).is_none());
        assert!(!reg.is_registered(&id));
        assert!(!reg.invoke(&id, json!({ "success": true })));
    }

    #[test]
    fn exit_guard_fails_an_unsettled_slot_once() {
        let reg = CallbackRegistry::new();
        let (id, rx) = reg.register();
        drop(SettleOnExit {
            registry: &reg,
            callback: &id,
        });
        assert!(matches!(rx.recv(), Ok(Settlement::Failed(_))));
        assert!(reg.registered().is_empty());
    }
}
