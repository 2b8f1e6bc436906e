//! The auth state machine.
//!
//! `AuthManager` is the single owner of the [`Session`]. Views read
//! snapshots through [`AuthManager::session`] or watch for changes through
//! [`AuthManager::subscribe`]; only the operations here mutate it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, Registration, RequestAuth};
use crate::models::User;

use super::session::{Session, SessionStatus};

/// Default upper bound on the startup `/auth/me` call
const DEFAULT_RESTORE_TIMEOUT_SECS: u64 = 10;

const LOGIN_FALLBACK_ERROR: &str = "Login failed";
const REGISTER_FALLBACK_ERROR: &str = "Registration failed";
const CREATE_CLIENT_FALLBACK_ERROR: &str = "Failed to create client";
const BUSY_ERROR: &str = "An authentication attempt is already in progress";

/// Result of `login` / `register`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(User),
    Rejected(String),
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AuthOutcome::Rejected(message) => Some(message),
            AuthOutcome::Authenticated(_) => None,
        }
    }
}

pub struct AuthManager {
    api: ApiClient,
    state: Arc<watch::Sender<Session>>,
    /// Held by restore, login and register; at most one runs at a time.
    in_flight: tokio::sync::Mutex<()>,
    restore_timeout: Duration,
}

impl AuthManager {
    /// Start in `Restoring`; call [`restore`](Self::restore) to settle.
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(Session::restoring());
        let state = Arc::new(state);

        // Runs on a 401, before the client notifies anyone else. Only a
        // session still holding the rejected token is reset.
        let invalidated = Arc::clone(&state);
        api.set_invalidation_hook(Arc::new(move |rejected: &str| {
            let reset = invalidated.send_if_modified(|s| s.token() == Some(rejected) && s.reset());
            if reset {
                info!("Session invalidated by server, now anonymous");
            }
        }));

        Self {
            api,
            state,
            in_flight: tokio::sync::Mutex::new(()),
            restore_timeout: Duration::from_secs(DEFAULT_RESTORE_TIMEOUT_SECS),
        }
    }

    pub fn with_restore_timeout(mut self, timeout: Duration) -> Self {
        self.restore_timeout = timeout;
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Change notifications for views.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    // ===== Restore =====

    /// One-shot startup restoration from the persisted token.
    ///
    /// Any failure of the `/auth/me` check, including the restore timeout,
    /// deletes the token and settles on `Anonymous`.
    pub async fn restore(&self) -> Session {
        let _attempt = self.in_flight.lock().await;
        let Some(token) = self.api.token() else {
            debug!("No persisted token, starting anonymous");
            self.state.send_if_modified(Session::reset);
            return self.session();
        };

        match tokio::time::timeout(self.restore_timeout, self.api.current_user()).await {
            Ok(Ok(user)) => {
                info!(user_id = user.id, role = %user.role, "Session restored");
                self.state.send_modify(|s| s.authenticate(user, token));
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Persisted token rejected, starting anonymous");
                self.api.clear_token();
                self.state.send_if_modified(Session::reset);
            }
            Err(_) => {
                warn!(timeout_secs = self.restore_timeout.as_secs(), "Session restore timed out");
                self.api.clear_token();
                self.state.send_if_modified(Session::reset);
            }
        }
        self.session()
    }

    // ===== Login / register =====

    /// Authenticate with email and password. Never returns an error; the
    /// failure message is both returned and stored as `last_error`.
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let Ok(_attempt) = self.in_flight.try_lock() else {
            warn!("Login requested while another attempt is in flight");
            return AuthOutcome::Rejected(BUSY_ERROR.to_string());
        };
        self.begin_authentication();

        let result = self.api.login(email, password).await;
        self.complete_authentication(result, LOGIN_FALLBACK_ERROR)
    }

    /// Self-registration. On success the new account is logged in.
    pub async fn register(&self, registration: &Registration) -> AuthOutcome {
        let Ok(_attempt) = self.in_flight.try_lock() else {
            warn!("Registration requested while another attempt is in flight");
            return AuthOutcome::Rejected(BUSY_ERROR.to_string());
        };
        self.begin_authentication();

        let result = self.api.register(registration, RequestAuth::Anonymous).await;
        self.complete_authentication(result, REGISTER_FALLBACK_ERROR)
    }

    fn begin_authentication(&self) {
        // A new attempt replaces whatever identity was stored before
        self.api.clear_token();
        self.state.send_modify(Session::begin_authentication);
    }

    fn complete_authentication(
        &self,
        result: Result<crate::api::AuthResponse, ApiError>,
        fallback: &str,
    ) -> AuthOutcome {
        let granted = result
            .and_then(|response| response.into_grant(fallback))
            .and_then(|(token, user)| {
                self.api.store_token(&token)?;
                Ok((token, user))
            });

        match granted {
            Ok((token, user)) => {
                info!(user_id = user.id, role = %user.role, "Authenticated");
                self.state.send_modify(|s| s.authenticate(user.clone(), token));
                AuthOutcome::Authenticated(user)
            }
            Err(e) => {
                let message = match e {
                    ApiError::InvalidResponse(_) => fallback.to_string(),
                    ref other => other.user_message(),
                };
                warn!(error = %e, "Authentication failed");
                self.state.send_modify(|s| s.fail(message.clone()));
                AuthOutcome::Rejected(message)
            }
        }
    }

    // ===== Administration =====

    /// Provision another account. Uses the registration endpoint with the
    /// caller's token but leaves the caller's session and token untouched.
    pub async fn create_client(&self, registration: &Registration) -> Result<User, ApiError> {
        let response = self.api.register(registration, RequestAuth::Stored).await?;
        if !response.success {
            let message = response
                .error_message()
                .unwrap_or_else(|| CREATE_CLIENT_FALLBACK_ERROR.to_string());
            return Err(ApiError::Credential(message));
        }
        let user = response.data.ok_or_else(|| {
            ApiError::InvalidResponse("Registration response is missing the new account".to_string())
        })?;
        info!(new_user_id = user.id, role = %user.role, "Client account created");
        Ok(user)
    }

    // ===== Logout =====

    /// Delete the persisted token and return to `Anonymous`. Always
    /// succeeds; calling it while anonymous changes nothing.
    pub fn logout(&self) {
        self.api.clear_token();
        let changed = self.state.send_if_modified(Session::reset);
        if changed {
            info!("Logged out");
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.session().status()
    }
}
