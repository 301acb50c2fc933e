use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the event backend on non-2xx responses.
///
/// The backend reports `{"detail": "..."}` for application errors and a
/// structured list under the same key for request validation errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: Value,
}

impl ApiError {
    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}
