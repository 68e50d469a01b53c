use chrono::Utc;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use uuid::Uuid;

const CALLBACK_PREFIX: &str = "brikks_cb_";

#[derive(Debug)]
pub(crate) enum Settlement {
    Resolved(serde_json::Value),
    Failed(String),
    Unanswered(String),
}

/// Named callbacks that replies can invoke, one per in-flight call.
///
/// Invoking or failing a slot removes it, so a call settles at most once and
/// anything arriving after removal is dropped.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    slots: Mutex<HashMap<String, Sender<Settlement>>>,
}

fn generate_callback_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}{}_{}",
        CALLBACK_PREFIX,
        Utc::now().timestamp_millis(),
        &suffix[..12]
    )
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Sender<Settlement>>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a fresh, unused callback name.
    pub(crate) fn register(&self) -> (String, Receiver<Settlement>) {
        let (tx, rx) = channel();
        let mut slots = self.lock();
        let mut id = generate_callback_id();
        while slots.contains_key(&id) {
            id = generate_callback_id();
        }
        slots.insert(id.clone(), tx);
        (id, rx)
    }

    /// Delivers a reply payload. Returns false when nothing is registered under
    /// `id` (already settled or timed out).
    pub fn invoke(&self, id: &str, payload: serde_json::Value) -> bool {
        let Some(tx) = self.lock().remove(id) else {
            tracing::warn!(callback = id, "reply for unregistered callback ignored");
            return false;
        };
        tx.send(Settlement::Resolved(payload)).is_ok()
    }

    pub(crate) fn settle(&self, id: &str, settlement: Settlement) -> bool {
        let Some(tx) = self.lock().remove(id) else {
            return false;
        };
        tx.send(settlement).is_ok()
    }

    pub fn deregister(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn registered(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}
