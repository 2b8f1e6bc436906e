use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::debug;

use smaf_core::auth::{MemoryTokenStore, SharedTokenStore};
use smaf_core::{ApiClient, AuthManager, Config, GuardDecision, Navigator, Route};

/// Command line switches that shape the session.
pub struct AppOptions {
    pub base_url: Option<String>,
    pub ephemeral: bool,
    pub json: bool,
}

/// Shared state for a single console invocation.
pub struct App {
    pub config: Config,
    pub auth: AuthManager,
    navigator: Navigator,
    json: bool,
}

impl App {
    /// Build the client stack and restore the saved session.
    pub async fn new(config: Config, options: AppOptions) -> Result<Self> {
        let tokens: SharedTokenStore = if options.ephemeral {
            Arc::new(MemoryTokenStore::new())
        } else {
            config.token_store()?
        };
        let base_url = options
            .base_url
            .unwrap_or_else(|| config.base_url().to_string());

        let api = ApiClient::with_timeout(&base_url, tokens, config.request_timeout())
            .context("Failed to create API client")?;
        let navigator = Navigator::new(Route::Transfer, api.subscribe());
        let auth = AuthManager::new(api).with_restore_timeout(config.restore_timeout());

        let session = auth.restore().await;
        debug!(status = %session.status(), "Session settled");

        Ok(Self {
            config,
            auth,
            navigator,
            json: options.json,
        })
    }

    /// Move to the view behind a command. Fails with a readable message
    /// when the guard sends the user elsewhere.
    pub fn enter(&mut self, route: Route) -> Result<()> {
        let session = self.auth.session();
        match self.navigator.navigate(route, &session) {
            GuardDecision::Render => Ok(()),
            GuardDecision::Redirect(Route::Login) => {
                bail!("{} requires a session. Run `smaf login` first.", route.path())
            }
            GuardDecision::Redirect(target) => {
                let role = session
                    .role()
                    .map(|r| r.display_name())
                    .unwrap_or("unknown");
                bail!(
                    "Your role ({}) cannot open {}. Try {} instead.",
                    role,
                    route.path(),
                    target.path()
                )
            }
            GuardDecision::Wait => bail!("Session is still being restored"),
        }
    }

    /// Navigate without turning a redirect into an error.
    pub fn open(&mut self, route: Route) -> GuardDecision {
        let session = self.auth.session();
        self.navigator.navigate(route, &session)
    }

    pub fn current_route(&self) -> Route {
        self.navigator.current()
    }

    /// Report a forced logout that happened while the command ran.
    pub fn finish(&mut self) {
        if let Some(route) = self.navigator.poll_redirect() {
            eprintln!("Your session has expired. Log in again with `smaf login` ({}).", route.path());
        }
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let out = serde_json::to_string_pretty(value).context("Failed to format JSON output")?;
        println!("{}", out);
        Ok(())
    }
}
