//! API client for communicating with the SMAF REST API.
//!
//! This module provides the `ApiClient` struct for making requests with the
//! persisted bearer token and turning failures into `ApiError` values.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{header, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::SharedTokenStore;
use crate::config::Config;

use super::{ApiError, ClientEvent};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Capacity of the client event channel. Events are rare (one per
/// invalidated session) so a small buffer is plenty.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Whether a request carries the persisted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAuth {
    /// Attach the persisted token when one exists.
    Stored,
    /// Never attach a token, and never treat a 401 as an expired session.
    Anonymous,
}

/// Called with the rejected token when a 401 invalidates the session.
pub(crate) type InvalidationHook = Arc<dyn Fn(&str) + Send + Sync>;

/// API client for SMAF.
/// Clone is cheap - reqwest::Client and the token store are reference counted.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: SharedTokenStore,
    events: broadcast::Sender<ClientEvent>,
    on_invalidated: Arc<RwLock<Option<InvalidationHook>>>,
}

impl ApiClient {
    /// Create a client with the default request timeout
    pub fn new(base_url: &str, tokens: SharedTokenStore) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, tokens, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        tokens: SharedTokenStore,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            events,
            on_invalidated: Arc::new(RwLock::new(None)),
        })
    }

    pub fn from_config(config: &Config, tokens: SharedTokenStore) -> Result<Self, ApiError> {
        Self::with_timeout(config.base_url(), tokens, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Receive client events such as `SessionInvalidated`.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Install the hook run synchronously on every session invalidation,
    /// before subscribers are notified. Shared by all clones.
    pub(crate) fn set_invalidation_hook(&self, hook: InvalidationHook) {
        let mut slot = self.on_invalidated.write().unwrap_or_else(|p| p.into_inner());
        *slot = Some(hook);
    }

    // ===== Token access =====

    /// The persisted token, if any. Storage failures read as "no token".
    pub fn token(&self) -> Option<String> {
        match self.tokens.get() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                None
            }
        }
    }

    pub fn store_token(&self, token: &str) -> Result<(), ApiError> {
        self.tokens
            .set(token)
            .map_err(|e| ApiError::InvalidResponse(format!("Could not persist session: {}", e)))
    }

    /// Remove the persisted token. Failures are logged, never returned.
    pub fn clear_token(&self) {
        if let Err(e) = self.tokens.remove() {
            warn!(error = %e, "Failed to remove persisted token");
        }
    }

    // ===== Request execution =====

    /// Send a request and decode a successful JSON body.
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        auth: RequestAuth,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_with_query(method, endpoint, &[], body, auth)
            .await
    }

    /// [`request`](Self::request) with `query` form-encoded onto the URL.
    pub async fn request_with_query<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        auth: RequestAuth,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let token = match auth {
            RequestAuth::Stored => self.token(),
            RequestAuth::Anonymous => None,
        };

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(ref token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, endpoint, authenticated = token.is_some(), "Sending API request");

        let response = request.send().await.map_err(|e| {
            warn!(%method, endpoint, error = %e, "API request failed");
            ApiError::Transport(e.to_string())
        })?;

        let response = self
            .check_response(response, endpoint, token.as_deref())
            .await?;

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", endpoint, e))
            } else {
                ApiError::Transport(e.to_string())
            }
        })
    }

    /// Check if response is successful, normalizing the error if not.
    async fn check_response(
        &self,
        response: Response,
        endpoint: &str,
        sent_token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(endpoint, status = status.as_u16(), "API request returned error status");

        if status == StatusCode::UNAUTHORIZED {
            if let Some(sent) = sent_token {
                self.invalidate_session(endpoint, sent);
                return Err(ApiError::AuthorizationExpired);
            }
        }

        Err(ApiError::from_status(status, &body))
    }

    /// Drop the token that was just rejected and tell subscribers.
    /// A token stored since the request was sent is left alone.
    fn invalidate_session(&self, endpoint: &str, rejected: &str) {
        if self.token().as_deref() != Some(rejected) {
            debug!(endpoint, "Rejected token already replaced, not invalidating");
            return;
        }

        self.clear_token();
        info!(endpoint, "Session token rejected, session invalidated");

        let hook = self
            .on_invalidated
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        if let Some(hook) = hook {
            hook(rejected);
        }

        // No receivers just means nothing is listening yet
        let _ = self.events.send(ClientEvent::SessionInvalidated {
            endpoint: endpoint.to_string(),
        });
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, endpoint, None, RequestAuth::Stored)
            .await
    }

    /// `GET` with filter pairs in the query string.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.request_with_query::<T, ()>(Method::GET, endpoint, query, None, RequestAuth::Stored)
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, endpoint, Some(body), RequestAuth::Stored)
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, endpoint, Some(body), RequestAuth::Stored)
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PATCH, endpoint, Some(body), RequestAuth::Stored)
            .await
    }

    pub async fn delete<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        self.request(Method::DELETE, endpoint, body, RequestAuth::Stored)
            .await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<serde_json::Value, ApiError> {
        self.get("/health").await
    }
}
