//! Login, registration and session commands.

use anyhow::{bail, Result};
use tracing::warn;

use smaf_core::forms::{self, RegistrationForm};
use smaf_core::models::Role;
use smaf_core::{AuthOutcome, Route, SessionStatus};

use super::{api_error, password_from_env_or_prompt, prompt_line, prompt_password};
use crate::app::App;

pub async fn login(app: &mut App, email: Option<String>) -> Result<()> {
    app.enter(Route::Login)?;

    let email = match email.or_else(|| app.config.last_email.clone()) {
        Some(email) => email,
        None => prompt_line("Email: ")?,
    };
    let password = password_from_env_or_prompt()?;
    forms::validate_login(&email, &password).map_err(api_error)?;

    match app.auth.login(email.trim(), &password).await {
        AuthOutcome::Authenticated(user) => {
            remember_email(app, email.trim());
            println!("Logged in as {} ({})", user.display_name(), user.role.display_name());
            app.open(Route::Dashboard);
            Ok(())
        }
        AuthOutcome::Rejected(message) => bail!("Login failed: {}", message),
    }
}

pub async fn register(app: &mut App, name: String, email: String, role: Role) -> Result<()> {
    app.enter(Route::Login)?;

    let password = prompt_password("Password: ")?;
    let confirm_password = prompt_password("Confirm password: ")?;
    let registration = RegistrationForm {
        name,
        email,
        password,
        confirm_password,
        role,
    }
    .validate()
    .map_err(api_error)?;

    match app.auth.register(&registration).await {
        AuthOutcome::Authenticated(user) => {
            remember_email(app, &user.email);
            println!("Account created. Logged in as {} ({})", user.display_name(), user.role.display_name());
            app.open(Route::Dashboard);
            Ok(())
        }
        AuthOutcome::Rejected(message) => bail!("Registration failed: {}", message),
    }
}

pub async fn create_client(app: &mut App, name: String, email: String, role: Role) -> Result<()> {
    app.enter(Route::CreateClient)?;

    let password = prompt_password("Password for the new account: ")?;
    let confirm_password = prompt_password("Confirm password: ")?;
    let registration = RegistrationForm {
        name,
        email,
        password,
        confirm_password,
        role,
    }
    .validate()
    .map_err(api_error)?;

    let user = app.auth.create_client(&registration).await.map_err(api_error)?;
    if app.json() {
        return app.print_json(&user);
    }
    println!(
        "Created {} <{}> with role {} (id {})",
        user.display_name(),
        user.email,
        user.role.display_name(),
        user.id
    );
    Ok(())
}

pub fn logout(app: &mut App) -> Result<()> {
    let was_authenticated = app.auth.session().is_authenticated();
    app.auth.logout();
    app.open(Route::Login);
    if was_authenticated {
        println!("Logged out");
    } else {
        println!("No active session");
    }
    Ok(())
}

pub fn whoami(app: &mut App) -> Result<()> {
    let session = app.auth.session();
    if app.json() {
        return app.print_json(&session);
    }
    match (session.status(), session.user()) {
        (SessionStatus::Authenticated, Some(user)) => {
            println!("{} <{}>", user.display_name(), user.email);
            println!("Role: {}", user.role.display_name());
        }
        (status, _) => println!("Not logged in ({})", status),
    }
    Ok(())
}

/// Keep the last email for the next login prompt. Failing to save is not fatal.
fn remember_email(app: &mut App, email: &str) {
    if app.config.last_email.as_deref() == Some(email) {
        return;
    }
    app.config.last_email = Some(email.to_string());
    if let Err(e) = app.config.save() {
        warn!(error = %e, "Failed to save config");
    }
}
