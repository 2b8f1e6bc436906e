//! Command definitions and dispatch.
//!
//! Each command stands for one console view and enters its route before
//! touching the API, so access rules live in one place.

mod rules;
mod session;
mod transactions;

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;

use smaf_core::models::{Role, RuleType};
use smaf_core::{ApiError, GuardDecision, Route};

use crate::app::App;

pub use rules::{RejectionsCommand, RulesCommand};
pub use transactions::TransactionsCommand;

/// Environment variable holding the password for non-interactive use
const PASSWORD_ENV: &str = "SMAF_PASSWORD";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with email and password
    Login {
        #[arg(long, env = "SMAF_EMAIL")]
        email: Option<String>,
    },
    /// Create an account and log in with it
    Register {
        #[arg(long)]
        name: String,
        #[arg(long, env = "SMAF_EMAIL")]
        email: String,
        #[arg(long, default_value = "viewer", value_parser = parse_role)]
        role: Role,
    },
    /// Forget the saved session
    Logout,
    /// Show the current session
    Whoami,
    /// Submit a transaction through the public transfer form
    Submit {
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "visa")]
        card_type: String,
        #[arg(long)]
        card_number: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Review transactions
    #[command(subcommand)]
    Transactions(TransactionsCommand),
    /// Manage fraud rules (admin)
    #[command(subcommand)]
    Rules(RulesCommand),
    /// Rejection statistics (admin, analyst)
    #[command(subcommand)]
    Rejections(RejectionsCommand),
    /// Provision an account for someone else (admin)
    CreateClient {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "viewer", value_parser = parse_role)]
        role: Role,
    },
    /// Show what the console would do when opening a path
    Open { path: String },
}

pub async fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Login { email } => session::login(app, email).await,
        Command::Register { name, email, role } => session::register(app, name, email, role).await,
        Command::Logout => session::logout(app),
        Command::Whoami => session::whoami(app),
        Command::Submit {
            amount,
            card_type,
            card_number,
            email,
            description,
        } => transactions::submit(app, amount, &card_type, &card_number, &email, description).await,
        Command::Transactions(cmd) => transactions::run(app, cmd).await,
        Command::Rules(cmd) => rules::run(app, cmd).await,
        Command::Rejections(cmd) => rules::run_rejections(app, cmd).await,
        Command::CreateClient { name, email, role } => {
            session::create_client(app, name, email, role).await
        }
        Command::Open { path } => open(app, &path),
    }
}

fn open(app: &mut App, path: &str) -> Result<()> {
    let route = Route::from_path(path);
    match app.open(route) {
        GuardDecision::Render => println!("{} -> render", route.path()),
        GuardDecision::Redirect(target) => {
            println!("{} -> redirect to {}", route.path(), target.path())
        }
        GuardDecision::Wait => println!("{} -> waiting for session restore", route.path()),
    }
    println!("Current view: {}", app.current_route().path());
    Ok(())
}

// ============================================================================
// Shared helpers
// ============================================================================

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse(s).ok_or_else(|| format!("unknown role '{}' (admin, analyst, viewer)", s))
}

fn parse_rule_type(s: &str) -> Result<RuleType, String> {
    RuleType::parse(s).ok_or_else(|| {
        let known: Vec<&str> = RuleType::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown rule type '{}' ({})", s, known.join(", "))
    })
}

/// Convert a client error into a message fit for the terminal.
fn api_error(err: ApiError) -> anyhow::Error {
    match err {
        ApiError::Validation(fields) => {
            let lines: Vec<String> = fields
                .iter()
                .map(|(field, message)| format!("  {}: {}", field, message))
                .collect();
            anyhow!("Please fix the following:\n{}", lines.join("\n"))
        }
        other => anyhow!(other.user_message()),
    }
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}

fn prompt_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(label)?;
    Ok(password)
}

/// Password from the environment, or ask for it.
fn password_from_env_or_prompt() -> Result<String> {
    match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => prompt_password("Password: "),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("Analyst"), Ok(Role::Analyst));
        assert!(parse_role("superuser").is_err());
    }

    #[test]
    fn test_parse_rule_type_accepts_dashes() {
        assert_eq!(parse_rule_type("blocked-card"), Ok(RuleType::BlockedCard));
        assert!(parse_rule_type("nope").unwrap_err().contains("low_amount"));
    }

    #[test]
    fn test_api_error_lists_fields() {
        let mut fields = smaf_core::api::FieldErrors::new();
        fields.add("email", "Email is required");
        let message = api_error(ApiError::Validation(fields)).to_string();
        assert!(message.contains("email: Email is required"));
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(or_dash(Some("x")), "x");
    }
}
