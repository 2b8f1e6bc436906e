//! Events emitted by the API client for the rest of the application.

/// Broadcast when the client observes something that affects the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A request carrying the persisted token came back 401. The token has
    /// already been removed from the store when this is delivered.
    SessionInvalidated { endpoint: String },
}
