//! Shared fixtures for the wiremock-backed tests.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use smaf_core::auth::{MemoryTokenStore, TokenStore};
use smaf_core::{ApiClient, AuthManager};
use wiremock::MockServer;

pub struct Harness {
    pub server: MockServer,
    pub store: Arc<MemoryTokenStore>,
    pub auth: AuthManager,
}

impl Harness {
    pub async fn start(token: Option<&str>) -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        });
        let api = ApiClient::new(&format!("{}/api", server.uri()), store.clone())
            .expect("Failed to build API client");
        let auth = AuthManager::new(api);
        Self { server, store, auth }
    }

    pub fn stored_token(&self) -> Option<String> {
        self.store.get().expect("memory store never fails")
    }
}

pub fn user_json(id: i64, email: &str, role: &str) -> Value {
    json!({ "id": id, "name": "Test User", "email": email, "role": role })
}
