//! Transactions submitted to SMAF for fraud scoring and manual review.

use serde::{Deserialize, Serialize};

use super::Pagination;

/// Review state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Approved,
    Pending,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionStatus::Approved => "Approved",
            TransactionStatus::Pending => "Pending review",
            TransactionStatus::Rejected => "Rejected",
            TransactionStatus::Unknown => "Unknown",
        }
    }
}

/// Reviewer summary embedded in a reviewed transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reviewer {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub transaction_id: Option<String>,
    pub amount: f64,
    pub card_type: Option<String>,
    pub last_four_digits: Option<String>,
    pub customer_email: Option<String>,
    pub description: Option<String>,
    pub operation_type: Option<String>,
    pub status: TransactionStatus,
    pub fraud_score: Option<f64>,
    pub risk_level: Option<String>,
    pub fraud_reasons: Option<serde_json::Value>,
    pub review_reason: Option<String>,
    pub reviewed_at: Option<String>,
    pub reviewer: Option<Reviewer>,
    pub created_at: Option<String>,
}

impl Transaction {
    /// Card number as shown in listings, e.g. `VISA **** 4242`.
    pub fn masked_card(&self) -> String {
        let brand = self
            .card_type
            .as_deref()
            .map(str::to_uppercase)
            .unwrap_or_else(|| "CARD".to_string());
        match self.last_four_digits.as_deref() {
            Some(last4) => format!("{} **** {}", brand, last4),
            None => brand,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}

/// List payload of `GET /transactions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Body of the public transfer form (`POST /transactions`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub amount: f64,
    pub card_type: String,
    pub card_number: String,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub operation_type: String,
}

impl NewTransaction {
    /// Build a submission, stripping whitespace from the card number.
    pub fn new(amount: f64, card_type: &str, card_number: &str, customer_email: &str) -> Self {
        Self {
            amount,
            card_type: card_type.trim().to_lowercase(),
            card_number: card_number.chars().filter(|c| !c.is_whitespace()).collect(),
            customer_email: customer_email.trim().to_string(),
            description: None,
            operation_type: "credit".to_string(),
        }
    }
}

/// Query filters for transaction listing and export.
///
/// Unset fields are left out of the query string entirely.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilters {
    pub status: Option<String>,
    pub risk_level: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TransactionFilters {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_non_empty(&mut pairs, "status", self.status.as_deref());
        push_non_empty(&mut pairs, "riskLevel", self.risk_level.as_deref());
        push_non_empty(&mut pairs, "search", self.search.as_deref());
        push_non_empty(&mut pairs, "startDate", self.start_date.as_deref());
        push_non_empty(&mut pairs, "endDate", self.end_date.as_deref());
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

pub(crate) fn push_non_empty(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(v) = value {
        if !v.trim().is_empty() {
            pairs.push((key, v.to_string()));
        }
    }
}
