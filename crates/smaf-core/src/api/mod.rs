//! REST API client module for the SMAF service.
//!
//! This module provides the `ApiClient` for communicating with the SMAF
//! API: authentication, transaction review and fraud rule management.
//!
//! Requests carry the persisted bearer token. A 401 on such a request
//! clears the token and emits `ClientEvent::SessionInvalidated`.

pub mod auth;
pub mod client;
pub mod error;
pub mod events;
pub mod fraud_rules;
pub mod transactions;

pub use auth::{AuthResponse, Registration};
pub use client::{ApiClient, RequestAuth};
pub use error::{ApiError, FieldErrors};
pub use events::ClientEvent;
