//! Authentication module for managing the console session.
//!
//! This module provides:
//! - `TokenStore`: Single-slot bearer token persistence (file, keychain, memory)
//! - `Session`: Snapshot of the current identity and its lifecycle status
//! - `AuthManager`: The state machine driving restore, login, register and logout

pub mod manager;
pub mod session;
pub mod token_store;

pub use manager::{AuthManager, AuthOutcome};
pub use session::{Session, SessionStatus};
pub use token_store::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, SharedTokenStore, TokenStore,
    TokenStoreError, TOKEN_KEY,
};
