//! SMAF console - a command line front end for the SMAF fraud monitoring API.
//!
//! Every command restores the saved session first, then asks the route
//! guard whether the view it stands for may be shown.

mod app;
mod commands;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smaf_core::Config;

use app::{App, AppOptions};
use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "smaf", version, about = "SMAF fraud monitoring console")]
struct Cli {
    /// API base URL (overrides the config file)
    #[arg(long, env = "SMAF_API_BASE_URL")]
    base_url: Option<String>,

    /// Keep the session token in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=smaf_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let config = Config::load()?;
    let options = AppOptions {
        base_url: cli.base_url,
        ephemeral: cli.ephemeral,
        json: cli.json,
    };
    info!(base_url = options.base_url.as_deref().unwrap_or(config.base_url()), "SMAF console starting");

    let mut app = App::new(config, options).await?;
    let result = commands::run(&mut app, cli.command).await;
    app.finish();
    result
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use commands::{RejectionsCommand, RulesCommand};

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rule_toggle() {
        let cli = Cli::try_parse_from([
            "smaf", "rules", "toggle", "4", "--active", "false", "--reason", "Falso positivo",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Rules(RulesCommand::Toggle { id: 4, active: false, .. })
        ));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["smaf", "rejections", "recent", "--json", "--ephemeral"]).unwrap();
        assert!(cli.json);
        assert!(cli.ephemeral);
        assert!(matches!(
            cli.command,
            Command::Rejections(RejectionsCommand::Recent { limit: None })
        ));
    }

    #[test]
    fn test_parse_rule_update() {
        let cli = Cli::try_parse_from([
            "smaf",
            "rules",
            "update",
            "5",
            "--type",
            "suspicious-domain",
            "--name",
            "Dominio temporal",
            "--value",
            r#"{"domain":"mailinator.com"}"#,
            "--reason",
            "Dominio usado en fraudes",
        ])
        .unwrap();
        match cli.command {
            Command::Rules(RulesCommand::Update { id, .. }) => assert_eq!(id, 5),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = Cli::try_parse_from([
            "smaf", "create-client", "--name", "Ana", "--email", "ana@smaf.co", "--role", "root",
        ]);
        assert!(result.is_err());
    }
}
