//! Authentication endpoints (`/auth/*`).
//!
//! These calls never touch the token store; persisting the issued token is
//! the auth manager's decision.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{ApiResponse, Role, User};

use super::error::extract_error_message;
use super::{ApiClient, ApiError, RequestAuth};

/// Body of `POST /auth/login`.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /auth/register`, used both for self-registration and for
/// an administrator creating another account.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Response of login and registration.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    pub token: Option<String>,
    pub data: Option<User>,
    pub message: Option<String>,
    pub error: Option<Value>,
}

impl AuthResponse {
    pub fn error_message(&self) -> Option<String> {
        let envelope = serde_json::json!({
            "error": self.error.clone().unwrap_or(Value::Null),
            "message": self.message.clone(),
        });
        extract_error_message(&envelope)
    }

    /// The issued token and account, or a credential error carrying the
    /// server's message (`fallback` when it sent none).
    pub fn into_grant(self, fallback: &str) -> Result<(String, User), ApiError> {
        if !self.success {
            let message = self.error_message().unwrap_or_else(|| fallback.to_string());
            return Err(ApiError::Credential(message));
        }
        match (self.token, self.data) {
            (Some(token), Some(user)) if !token.is_empty() => Ok((token, user)),
            _ => Err(ApiError::InvalidResponse(
                "Authentication response is missing token or user".to_string(),
            )),
        }
    }
}

impl ApiClient {
    /// `POST /auth/login`. Sent without the stored token so a bad password
    /// is reported as a credential error, not an expired session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest { email, password };
        self.request(Method::POST, "/auth/login", Some(&body), RequestAuth::Anonymous)
            .await
    }

    /// `POST /auth/register`
    pub async fn register(
        &self,
        registration: &Registration,
        auth: RequestAuth,
    ) -> Result<AuthResponse, ApiError> {
        self.request(Method::POST, "/auth/register", Some(registration), auth)
            .await
    }

    /// `GET /auth/me` - the account behind the stored token.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let response: ApiResponse<User> = self.get("/auth/me").await?;
        if !response.success {
            let message = response
                .error_message()
                .unwrap_or_else(|| "Session is no longer valid".to_string());
            return Err(ApiError::Credential(message));
        }
        response
            .data
            .ok_or_else(|| ApiError::InvalidResponse("`/auth/me` returned no user".to_string()))
    }
}
