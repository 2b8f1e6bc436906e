use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Field name to message, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid input - {0}")]
    Validation(FieldErrors),

    #[error("{0}")]
    Credential(String),

    #[error("Session expired - please log in again")]
    AuthorizationExpired,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        body: Value,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies kept on an error
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Pull a human readable message out of an error body.
///
/// Checked in order: `error.message`, `message`, `error` as a string.
pub fn extract_error_message(body: &Value) -> Option<String> {
    fn non_empty(v: Option<&Value>) -> Option<String> {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    non_empty(body.get("error").and_then(|e| e.get("message")))
        .or_else(|| non_empty(body.get("message")))
        .or_else(|| non_empty(body.get("error")))
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Normalize a non-2xx response. 401 here means no session token was
    /// involved, so it is reported as a credential rejection.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let parsed: Value = serde_json::from_str(body)
            .unwrap_or_else(|_| Value::String(Self::truncate_body(body)));
        let message = extract_error_message(&parsed)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

        match status.as_u16() {
            401 => ApiError::Credential(message),
            code => ApiError::Server {
                status: code,
                message,
                body: parsed,
            },
        }
    }

    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::AuthorizationExpired => Some(401),
            _ => None,
        }
    }

    /// Message suitable for an inline banner. Server supplied text is kept
    /// verbatim, transport failures get a generic hint.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(fields) => fields.to_string(),
            ApiError::Credential(message) => message.clone(),
            ApiError::AuthorizationExpired => self.to_string(),
            ApiError::Transport(_) => {
                "Unable to connect to server. Check your connection.".to_string()
            }
            ApiError::Server { message, .. } => message.clone(),
            ApiError::InvalidResponse(_) => "Unexpected response from server".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_message_precedence() {
        let nested = serde_json::json!({
            "error": {"message": "nested"},
            "message": "top-level"
        });
        assert_eq!(extract_error_message(&nested).as_deref(), Some("nested"));

        let top = serde_json::json!({"message": "top-level", "error": "string"});
        assert_eq!(extract_error_message(&top).as_deref(), Some("top-level"));

        let string = serde_json::json!({"error": "string"});
        assert_eq!(extract_error_message(&string).as_deref(), Some("string"));

        assert_eq!(extract_error_message(&serde_json::json!({})), None);
    }

    #[test]
    fn test_from_status_fallback_message() {
        match ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") {
            ApiError::Server { status, message, body } => {
                assert_eq!(status, 502);
                assert_eq!(message, "HTTP error! status: 502");
                assert_eq!(body, Value::String("<html>bad gateway</html>".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_status_keeps_structured_body() {
        let body = r#"{"success":false,"error":{"message":"Regla duplicada","code":"DUP"}}"#;
        match ApiError::from_status(StatusCode::CONFLICT, body) {
            ApiError::Server { status, message, body } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Regla duplicada");
                assert_eq!(body["error"]["code"], "DUP");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unauthorized_without_token_is_credential_error() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"error":"Credenciales inválidas"}"#);
        assert!(matches!(err, ApiError::Credential(ref m) if m == "Credenciales inválidas"));
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let body = "é".repeat(400);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Email is required");
        errors.add("email", "Email is invalid");
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors.into_result(), Err(ApiError::Validation(_))));
    }
}
