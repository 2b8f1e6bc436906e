//! Transfer form and transaction review commands.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use smaf_core::forms;
use smaf_core::models::{NewTransaction, Transaction, TransactionFilters};
use smaf_core::Route;

use super::{api_error, or_dash};
use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum TransactionsCommand {
    /// List transactions
    List(FilterArgs),
    /// Show one transaction
    Show { id: i64 },
    /// Approve a pending transaction (admin, analyst)
    Approve {
        id: i64,
        #[arg(long)]
        reason: String,
    },
    /// Reject a pending transaction (admin, analyst)
    Reject {
        id: i64,
        #[arg(long)]
        reason: String,
    },
    /// Aggregate counts
    Stats,
    /// Export transactions matching the filters as JSON
    Export(FilterArgs),
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    risk_level: Option<String>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    end_date: Option<String>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
}

impl From<FilterArgs> for TransactionFilters {
    fn from(args: FilterArgs) -> Self {
        TransactionFilters {
            status: args.status,
            risk_level: args.risk_level,
            search: args.search,
            start_date: args.start_date,
            end_date: args.end_date,
            page: args.page,
            limit: args.limit,
        }
    }
}

pub async fn submit(
    app: &mut App,
    amount: f64,
    card_type: &str,
    card_number: &str,
    email: &str,
    description: Option<String>,
) -> Result<()> {
    app.enter(Route::Transfer)?;

    let mut transaction = NewTransaction::new(amount, card_type, card_number, email);
    transaction.description = description.filter(|d| !d.trim().is_empty());
    forms::validate_transaction(&transaction).map_err(api_error)?;

    let response = app
        .auth
        .api()
        .create_transaction(&transaction)
        .await
        .map_err(api_error)?;
    if app.json() {
        return app.print_json(&response);
    }

    let data = response.get("data").unwrap_or(&response);
    println!("Transaction submitted");
    println!("  Status:      {}", or_dash(data.get("status").and_then(Value::as_str)));
    println!("  Risk level:  {}", or_dash(data.get("riskLevel").and_then(Value::as_str)));
    if let Some(score) = data.get("fraudScore").and_then(Value::as_f64) {
        println!("  Fraud score: {:.2}", score);
    }
    Ok(())
}

pub async fn run(app: &mut App, command: TransactionsCommand) -> Result<()> {
    app.enter(Route::Transactions)?;
    let api = app.auth.api().clone();

    match command {
        TransactionsCommand::List(args) => {
            let filters: TransactionFilters = args.into();
            let response = api.list_transactions(&filters).await.map_err(api_error)?;
            let page = response.data.unwrap_or_default();
            if app.json() {
                return app.print_json(&page.transactions);
            }
            print_table(&page.transactions);
            let p = &page.pagination;
            println!("Page {} of {} ({} total)", p.page, p.pages, p.total);
        }
        TransactionsCommand::Show { id } => {
            let response = api.get_transaction(id).await.map_err(api_error)?;
            let Some(transaction) = response.data else {
                bail!("Transaction {} not found", id);
            };
            if app.json() {
                return app.print_json(&transaction);
            }
            print_detail(&transaction);
        }
        TransactionsCommand::Approve { id, reason } => {
            ensure_reviewer(app)?;
            api.approve_transaction(id, reason.trim())
                .await
                .map_err(api_error)?;
            println!("Transaction {} approved", id);
        }
        TransactionsCommand::Reject { id, reason } => {
            ensure_reviewer(app)?;
            api.reject_transaction(id, reason.trim())
                .await
                .map_err(api_error)?;
            println!("Transaction {} rejected", id);
        }
        TransactionsCommand::Stats => {
            let response = api.transaction_stats().await.map_err(api_error)?;
            app.print_json(&response.data.unwrap_or(Value::Null))?;
        }
        TransactionsCommand::Export(args) => {
            let filters: TransactionFilters = args.into();
            let body = api.export_transactions(&filters).await.map_err(api_error)?;
            app.print_json(&body)?;
        }
    }
    Ok(())
}

/// Review actions are limited to admins and analysts.
fn ensure_reviewer(app: &App) -> Result<()> {
    match app.auth.session().role() {
        Some(role) if role.can_review() => Ok(()),
        Some(role) => bail!("{} accounts cannot review transactions", role.display_name()),
        None => bail!("Not logged in"),
    }
}

fn print_table(transactions: &[Transaction]) {
    if transactions.is_empty() {
        println!("No transactions");
        return;
    }
    println!(
        "{:>6}  {:<16}  {:>12}  {:<20}  {:<9}  {:>5}",
        "ID", "REFERENCE", "AMOUNT", "CARD", "STATUS", "SCORE"
    );
    for t in transactions {
        println!(
            "{:>6}  {:<16}  {:>12.2}  {:<20}  {:<9}  {:>5}",
            t.id,
            or_dash(t.transaction_id.as_deref()),
            t.amount,
            t.masked_card(),
            t.status.display_name(),
            t.fraud_score
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
}

fn print_detail(t: &Transaction) {
    println!("Transaction {} ({})", t.id, or_dash(t.transaction_id.as_deref()));
    println!("  Amount:      {:.2}", t.amount);
    println!("  Card:        {}", t.masked_card());
    println!("  Customer:    {}", or_dash(t.customer_email.as_deref()));
    println!("  Status:      {}", t.status.display_name());
    println!("  Risk level:  {}", or_dash(t.risk_level.as_deref()));
    if let Some(score) = t.fraud_score {
        println!("  Fraud score: {:.2}", score);
    }
    if let Some(reasons) = &t.fraud_reasons {
        println!("  Reasons:     {}", reasons);
    }
    if let Some(reason) = t.review_reason.as_deref() {
        let reviewer = t
            .reviewer
            .as_ref()
            .and_then(|r| r.name.as_deref().or(r.email.as_deref()));
        println!("  Review:      {} (by {})", reason, or_dash(reviewer));
    }
    println!("  Created:     {}", or_dash(t.created_at.as_deref()));
}
