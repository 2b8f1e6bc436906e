use std::fmt;

use serde::Serialize;

use crate::models::{Role, User};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Startup; a persisted token may still be under validation.
    Restoring,
    Anonymous,
    Authenticating,
    Authenticated,
    /// The last login or registration attempt was rejected.
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Restoring => "restoring",
            SessionStatus::Anonymous => "anonymous",
            SessionStatus::Authenticating => "authenticating",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of who is logged in.
///
/// `user` is present exactly when `status` is `Authenticated`. The fields
/// are only mutated by `AuthManager`, through the transition methods below.
#[derive(Clone, PartialEq, Serialize)]
pub struct Session {
    status: SessionStatus,
    user: Option<User>,
    #[serde(skip)]
    token: Option<String>,
    last_error: Option<String>,
}

impl Session {
    pub(crate) fn restoring() -> Self {
        Self {
            status: SessionStatus::Restoring,
            user: None,
            token: None,
            last_error: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Startup restoration has finished one way or the other.
    pub fn is_settled(&self) -> bool {
        self.status != SessionStatus::Restoring
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role().map(|r| roles.contains(&r)).unwrap_or(false)
    }

    // ===== Transitions =====

    /// Back to anonymous, dropping user, token and error.
    pub(crate) fn reset(&mut self) -> bool {
        let next = Self {
            status: SessionStatus::Anonymous,
            user: None,
            token: None,
            last_error: None,
        };
        let changed = *self != next;
        *self = next;
        changed
    }

    pub(crate) fn begin_authentication(&mut self) {
        self.status = SessionStatus::Authenticating;
        self.user = None;
        self.token = None;
        self.last_error = None;
    }

    pub(crate) fn authenticate(&mut self, user: User, token: String) {
        self.status = SessionStatus::Authenticated;
        self.user = Some(user);
        self.token = Some(token);
        self.last_error = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = SessionStatus::Failed;
        self.user = None;
        self.token = None;
        self.last_error = Some(message);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status)
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("last_error", &self.last_error)
            .finish()
    }
}
