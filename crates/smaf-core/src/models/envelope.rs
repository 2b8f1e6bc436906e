//! The `{ success, data, message, error }` envelope wrapped around SMAF responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::extract_error_message;

/// Standard response envelope.
///
/// `error` is either a plain string or an object with a `message` field,
/// depending on which server handler produced it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl<T> ApiResponse<T> {
    /// Server supplied failure message, if any.
    pub fn error_message(&self) -> Option<String> {
        let envelope = serde_json::json!({
            "error": self.error.clone().unwrap_or(Value::Null),
            "message": self.message.clone(),
        });
        extract_error_message(&envelope)
    }
}

/// Page bookkeeping returned alongside list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u32,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }
}
