//! Route protection.
//!
//! [`guard`] decides, for a route and a session snapshot, whether a view may
//! render, must wait for session restoration, or must redirect. The
//! [`Navigator`] applies those decisions and follows the API client's
//! `SessionInvalidated` events back to the login page.

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::api::ClientEvent;
use crate::auth::Session;
use crate::models::Role;

/// Console views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    /// Public transaction form, also served at `/`.
    Transfer,
    Dashboard,
    Transactions,
    FraudRules,
    RejectionStats,
    CreateClient,
}

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

/// Where unauthenticated navigation is sent.
pub const LOGIN_ROUTE: Route = Route::Login;

/// Where authenticated users land when a role check fails.
pub const DEFAULT_LANDING: Route = Route::Dashboard;

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const REVIEWERS: &[Role] = &[Role::Admin, Role::Analyst];

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Transfer => "/transfer",
            Route::Dashboard => "/dashboard",
            Route::Transactions => "/transactions",
            Route::FraudRules => "/fraud-rules",
            Route::RejectionStats => "/fraud-rules/rejections",
            Route::CreateClient => "/create-client",
        }
    }

    /// Resolve a path. Query strings and trailing slashes are ignored;
    /// unknown paths fall back to the public transfer form.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        match path {
            "/login" => Route::Login,
            "" | "/transfer" => Route::Transfer,
            "/dashboard" => Route::Dashboard,
            "/transactions" => Route::Transactions,
            "/fraud-rules" => Route::FraudRules,
            "/fraud-rules/rejections" => Route::RejectionStats,
            "/create-client" => Route::CreateClient,
            _ => Route::Transfer,
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login | Route::Transfer => Access::Public,
            Route::Dashboard | Route::Transactions => Access::Authenticated,
            Route::FraudRules | Route::CreateClient => Access::Roles(ADMIN_ONLY),
            Route::RejectionStats => Access::Roles(REVIEWERS),
        }
    }
}

/// What to do with a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still restoring: show a neutral waiting indicator.
    Wait,
    Redirect(Route),
    Render,
}

/// Decide whether `route` may render for `session`.
///
/// The attempted destination is not remembered across a redirect to login.
pub fn guard(route: Route, session: &Session) -> GuardDecision {
    let required = match route.access() {
        Access::Public => return GuardDecision::Render,
        Access::Authenticated => None,
        Access::Roles(roles) => Some(roles),
    };

    if !session.is_settled() {
        return GuardDecision::Wait;
    }
    if !session.is_authenticated() {
        return GuardDecision::Redirect(LOGIN_ROUTE);
    }
    match required {
        Some(roles) if !session.has_any_role(roles) => GuardDecision::Redirect(DEFAULT_LANDING),
        _ => GuardDecision::Render,
    }
}

/// Tracks the current route and reacts to session invalidation.
pub struct Navigator {
    current: Route,
    events: broadcast::Receiver<ClientEvent>,
}

impl Navigator {
    pub fn new(start: Route, events: broadcast::Receiver<ClientEvent>) -> Self {
        Self {
            current: start,
            events,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Navigate to `route`, following guard redirects. Returns the decision
    /// for the requested route; `current` is where navigation ended up.
    pub fn navigate(&mut self, route: Route, session: &Session) -> GuardDecision {
        let decision = guard(route, session);
        match decision {
            GuardDecision::Render => self.current = route,
            GuardDecision::Redirect(target) => {
                debug!(from = route.path(), to = target.path(), "Guard redirect");
                self.current = target;
            }
            GuardDecision::Wait => {}
        }
        decision
    }

    /// Drain client events. Returns the login route when the session was
    /// invalidated since the last call, and moves there.
    pub fn poll_redirect(&mut self) -> Option<Route> {
        let mut redirect = None;
        loop {
            match self.events.try_recv() {
                Ok(ClientEvent::SessionInvalidated { endpoint }) => {
                    info!(endpoint = %endpoint, "Session expired, redirecting to login");
                    redirect = Some(LOGIN_ROUTE);
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    redirect = Some(LOGIN_ROUTE);
                }
                Err(_) => break,
            }
        }
        if let Some(target) = redirect {
            self.current = target;
        }
        redirect
    }
}
