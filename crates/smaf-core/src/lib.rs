//! Core library for the SMAF console.
//!
//! Provides the pieces the console front end is built from:
//!
//! - [`api`]: HTTP client for the SMAF REST API with centralized 401 handling
//! - [`auth`]: Token persistence and the session state machine
//! - [`guard`]: Route protection and navigation
//! - [`forms`]: Client-side validation run before any request
//! - [`models`]: Users, transactions, fraud rules and response envelopes
//! - [`config`]: Console configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod forms;
pub mod guard;
pub mod models;

pub use api::{ApiClient, ApiError, ClientEvent};
pub use auth::{AuthManager, AuthOutcome, Session, SessionStatus};
pub use config::Config;
pub use guard::{guard, GuardDecision, Navigator, Route};
