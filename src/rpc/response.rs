use serde::Serialize;
use serde_json::Value;

const DEFAULT_FAILURE_MESSAGE: &str = "action failed";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ActionOutcome {
    Ok { data: Value },
    Err { message: String },
}

/// Reply payload of one action call, kept exactly as the endpoint sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    payload: Value,
}

impl ActionResponse {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Only an explicit `success: false` is a failure.
    pub fn succeeded(&self) -> bool {
        self.payload.get("success").and_then(Value::as_bool) != Some(false)
    }

    pub fn outcome(&self) -> ActionOutcome {
        if self.succeeded() {
            ActionOutcome::Ok { data: self.data() }
        } else {
            ActionOutcome::Err {
                message: self.failure_message(),
            }
        }
    }

    fn data(&self) -> Value {
        if let Some(d) = self.payload.get("data") {
            return d.clone();
        }
        match &self.payload {
            Value::Object(map) => {
                let rest: serde_json::Map<String, Value> = map
                    .iter()
                    .filter(|(k, _)| k.as_str() != "success")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                if rest.is_empty() {
                    Value::Null
                } else {
                    Value::Object(rest)
                }
            }
            other => other.clone(),
        }
    }

    fn failure_message(&self) -> String {
        ["error", "message"]
            .iter()
            .find_map(|k| self.payload.get(*k).and_then(Value::as_str))
            .unwrap_or(DEFAULT_FAILURE_MESSAGE)
            .to_string()
    }
}
