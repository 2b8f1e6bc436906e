//! Fraud rule administration and rejection statistics.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Subcommand};
use serde_json::Value;

use smaf_core::forms;
use smaf_core::models::{AuditLog, FraudRule, NewFraudRule, RuleFilters, RuleType};
use smaf_core::Route;

use super::{api_error, or_dash, parse_rule_type};
use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List rules
    List(RuleFilterArgs),
    /// Show one rule
    Show { id: i64 },
    /// Create a rule
    Create(CreateRuleArgs),
    /// Replace an existing rule
    Update {
        id: i64,
        #[command(flatten)]
        rule: CreateRuleArgs,
    },
    /// Activate or deactivate a rule
    Toggle {
        id: i64,
        #[arg(long, action = ArgAction::Set)]
        active: bool,
        #[arg(long)]
        reason: String,
    },
    /// Delete a rule
    Delete {
        id: i64,
        #[arg(long)]
        reason: String,
    },
    /// Rule counts by type and state
    Stats,
    /// Rule change history
    Audit(RuleFilterArgs),
    /// Audit activity counts for a date range
    AuditStats {
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
    },
    /// Export rules matching the filters as JSON
    Export(RuleFilterArgs),
}

#[derive(Subcommand, Debug)]
pub enum RejectionsCommand {
    /// Rejections grouped by rule
    Stats {
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
    },
    /// Summary for the dashboard
    Dashboard,
    /// Most recent rejections (10 unless --limit is given)
    Recent {
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Args, Debug)]
pub struct RuleFilterArgs {
    #[arg(long = "type", value_parser = parse_rule_type)]
    rule_type: Option<RuleType>,
    #[arg(long)]
    active: Option<bool>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
}

impl From<RuleFilterArgs> for RuleFilters {
    fn from(args: RuleFilterArgs) -> Self {
        RuleFilters {
            rule_type: args.rule_type,
            is_active: args.active,
            search: args.search,
            page: args.page,
            limit: args.limit,
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct CreateRuleArgs {
    #[arg(long = "type", value_parser = parse_rule_type)]
    rule_type: RuleType,
    #[arg(long)]
    name: String,
    /// Rule payload as JSON, e.g. '{"lastFourDigits":"4242"}'
    #[arg(long)]
    value: String,
    /// Why the rule is being added (kept in the audit trail)
    #[arg(long)]
    reason: String,
    #[arg(long)]
    description: Option<String>,
    /// Defaults to the standard impact for the rule type
    #[arg(long)]
    score_impact: Option<f64>,
    #[arg(long)]
    valid_from: Option<String>,
    #[arg(long)]
    valid_until: Option<String>,
    /// Create the rule switched off
    #[arg(long)]
    inactive: bool,
}

impl CreateRuleArgs {
    fn into_rule(self) -> Result<NewFraudRule> {
        let value: Value = serde_json::from_str(&self.value).context("Rule value must be valid JSON")?;
        let mut rule = NewFraudRule::new(self.rule_type, self.name.trim(), value, self.reason.trim());
        rule.description = self.description.unwrap_or_default();
        if let Some(impact) = self.score_impact {
            rule.score_impact = impact;
        }
        rule.valid_from = self.valid_from;
        rule.valid_until = self.valid_until;
        rule.is_active = !self.inactive;
        Ok(rule)
    }
}

pub async fn run(app: &mut App, command: RulesCommand) -> Result<()> {
    app.enter(Route::FraudRules)?;
    let api = app.auth.api().clone();

    match command {
        RulesCommand::List(args) => {
            let filters: RuleFilters = args.into();
            let response = api.list_rules(&filters).await.map_err(api_error)?;
            let page = response.data.unwrap_or_default();
            if app.json() {
                return app.print_json(&page.rules);
            }
            print_rules(&page.rules);
            let p = &page.pagination;
            println!("Page {} of {} ({} total)", p.page, p.pages, p.total);
        }
        RulesCommand::Show { id } => {
            let response = api.get_rule(id).await.map_err(api_error)?;
            let Some(rule) = response.data else {
                bail!("Rule {} not found", id);
            };
            if app.json() {
                return app.print_json(&rule);
            }
            print_rule(&rule);
        }
        RulesCommand::Create(args) => {
            let rule = args.into_rule()?;
            forms::validate_rule(&rule).map_err(api_error)?;
            let response = api.create_rule(&rule).await.map_err(api_error)?;
            match response.data {
                Some(created) => println!("Rule {} created: {}", created.id, created.name),
                None => println!("Rule created"),
            }
        }
        RulesCommand::Update { id, rule } => {
            let rule = rule.into_rule()?;
            forms::validate_rule(&rule).map_err(api_error)?;
            api.update_rule(id, &rule).await.map_err(api_error)?;
            println!("Rule {} updated", id);
        }
        RulesCommand::Toggle { id, active, reason } => {
            api.toggle_rule(id, active, reason.trim())
                .await
                .map_err(api_error)?;
            let state = if active { "activated" } else { "deactivated" };
            println!("Rule {} {}", id, state);
        }
        RulesCommand::Delete { id, reason } => {
            api.delete_rule(id, reason.trim()).await.map_err(api_error)?;
            println!("Rule {} deleted", id);
        }
        RulesCommand::Stats => {
            let response = api.rule_stats().await.map_err(api_error)?;
            app.print_json(&response.data.unwrap_or(Value::Null))?;
        }
        RulesCommand::Audit(args) => {
            let filters: RuleFilters = args.into();
            let response = api.audit_logs(&filters).await.map_err(api_error)?;
            let page = response.data.unwrap_or_default();
            if app.json() {
                return app.print_json(&page.logs);
            }
            print_audit(&page.logs);
        }
        RulesCommand::AuditStats {
            start_date,
            end_date,
        } => {
            let filters = RuleFilters {
                start_date,
                end_date,
                ..Default::default()
            };
            let response = api.audit_log_stats(&filters).await.map_err(api_error)?;
            app.print_json(&response.data.unwrap_or(Value::Null))?;
        }
        RulesCommand::Export(args) => {
            let filters: RuleFilters = args.into();
            let response = api.export_rules(&filters).await.map_err(api_error)?;
            app.print_json(&response.data.unwrap_or(Value::Null))?;
        }
    }
    Ok(())
}

pub async fn run_rejections(app: &mut App, command: RejectionsCommand) -> Result<()> {
    app.enter(Route::RejectionStats)?;
    let api = app.auth.api().clone();

    let data = match command {
        RejectionsCommand::Stats {
            start_date,
            end_date,
        } => {
            let filters = RuleFilters {
                start_date,
                end_date,
                ..Default::default()
            };
            api.rejection_stats(&filters).await.map_err(api_error)?.data
        }
        RejectionsCommand::Dashboard => api.dashboard_rejections().await.map_err(api_error)?.data,
        RejectionsCommand::Recent { limit } => {
            api.recent_rejections(limit).await.map_err(api_error)?.data
        }
    };
    app.print_json(&data.unwrap_or(Value::Null))
}

fn print_rules(rules: &[FraudRule]) {
    if rules.is_empty() {
        println!("No rules");
        return;
    }
    println!(
        "{:>5}  {:<18}  {:<30}  {:>6}  {:<8}  {}",
        "ID", "TYPE", "NAME", "IMPACT", "ACTIVE", "VALIDITY"
    );
    for r in rules {
        println!(
            "{:>5}  {:<18}  {:<30}  {:>6}  {:<8}  {}",
            r.id,
            r.rule_type.as_str(),
            r.name,
            r.score_impact
                .map(|s| format!("{:+.2}", s))
                .unwrap_or_else(|| "-".to_string()),
            if r.is_active { "yes" } else { "no" },
            r.validity_display(),
        );
    }
}

fn print_rule(rule: &FraudRule) {
    println!("Rule {}: {}", rule.id, rule.name);
    println!("  Type:        {}", rule.rule_type);
    println!("  Value:       {}", rule.value_object());
    println!("  Active:      {}", if rule.is_active { "yes" } else { "no" });
    println!("  Validity:    {}", rule.validity_display());
    if let Some(impact) = rule.score_impact {
        println!("  Impact:      {:+.2}", impact);
    }
    println!("  Description: {}", or_dash(rule.description.as_deref()));
    println!("  Reason:      {}", or_dash(rule.reason.as_deref()));
}

fn print_audit(logs: &[AuditLog]) {
    if logs.is_empty() {
        println!("No audit entries");
        return;
    }
    for log in logs {
        let actor = log
            .user
            .as_ref()
            .and_then(|u| u.name.as_deref().or(u.email.as_deref()));
        println!(
            "{}  {:<10}  {:<24}  {}",
            or_dash(log.created_at.as_deref()),
            log.action,
            or_dash(actor),
            or_dash(log.reason.as_deref()),
        );
    }
}
