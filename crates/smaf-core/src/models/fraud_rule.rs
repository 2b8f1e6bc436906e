//! Fraud rule configuration records and their audit trail.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::transaction::push_non_empty;
use super::Pagination;

/// Kind of fraud rule. Each kind has its own panel and fixed score impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    BlockedCard,
    CardWhitelist,
    EmailWhitelist,
    SuspiciousDomain,
    BlockedFranchise,
    LowAmount,
}

impl RuleType {
    pub const ALL: [RuleType; 6] = [
        RuleType::BlockedCard,
        RuleType::CardWhitelist,
        RuleType::EmailWhitelist,
        RuleType::SuspiciousDomain,
        RuleType::BlockedFranchise,
        RuleType::LowAmount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::BlockedCard => "blocked_card",
            RuleType::CardWhitelist => "card_whitelist",
            RuleType::EmailWhitelist => "email_whitelist",
            RuleType::SuspiciousDomain => "suspicious_domain",
            RuleType::BlockedFranchise => "blocked_franchise",
            RuleType::LowAmount => "low_amount",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|t| t.as_str() == normalized)
    }

    /// Score impact applied when a rule of this type matches.
    /// Blocklists raise the fraud score, whitelists lower it.
    pub fn default_score_impact(&self) -> f64 {
        match self {
            RuleType::BlockedCard => 0.9,
            RuleType::BlockedFranchise => 0.8,
            RuleType::SuspiciousDomain => 0.7,
            RuleType::CardWhitelist => -0.4,
            RuleType::EmailWhitelist => -0.3,
            RuleType::LowAmount => -0.2,
        }
    }

    /// Keys the rule's `value` object must carry.
    pub fn required_value_fields(&self) -> &'static [&'static str] {
        match self {
            RuleType::BlockedCard | RuleType::CardWhitelist => &["lastFourDigits"],
            RuleType::EmailWhitelist => &["email"],
            RuleType::SuspiciousDomain => &["domain"],
            RuleType::BlockedFranchise => &["franchise"],
            RuleType::LowAmount => &["franchise", "maxAmount"],
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudRule {
    pub id: i64,
    pub rule_type: RuleType,
    pub name: String,
    pub description: Option<String>,
    /// Rule payload. Older records store it as a JSON encoded string.
    #[serde(default)]
    pub value: Value,
    pub score_impact: Option<f64>,
    #[serde(default)]
    pub is_active: bool,
    pub valid_from: Option<String>,
    pub valid_until: Option<String>,
    pub reason: Option<String>,
    pub created_at: Option<String>,
}

impl FraudRule {
    /// The rule payload as an object, decoding string encoded payloads.
    pub fn value_object(&self) -> Value {
        match &self.value {
            Value::String(s) => serde_json::from_str(s).unwrap_or(Value::Null),
            other => other.clone(),
        }
    }

    /// Validity window for display: `Permanent` when unbounded.
    pub fn validity_display(&self) -> String {
        match (self.valid_from.as_deref(), self.valid_until.as_deref()) {
            (None, None) => "Permanent".to_string(),
            (from, until) => format!(
                "{} - {}",
                from.map(short_date).unwrap_or("start"),
                until.map(short_date).unwrap_or("indefinite")
            ),
        }
    }
}

fn short_date(s: &str) -> &str {
    s.get(..10).unwrap_or(s)
}

/// Body for creating or updating a rule.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFraudRule {
    pub rule_type: RuleType,
    pub name: String,
    pub description: String,
    pub value: Value,
    pub score_impact: f64,
    pub is_active: bool,
    pub valid_from: Option<String>,
    pub valid_until: Option<String>,
    pub reason: String,
}

impl NewFraudRule {
    /// Start a rule of the given type with its standard score impact.
    pub fn new(rule_type: RuleType, name: &str, value: Value, reason: &str) -> Self {
        Self {
            rule_type,
            name: name.to_string(),
            description: String::new(),
            value,
            score_impact: rule_type.default_score_impact(),
            is_active: true,
            valid_from: None,
            valid_until: None,
            reason: reason.to_string(),
        }
    }
}

/// List payload of `GET /fraud-rules`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulePage {
    #[serde(default)]
    pub rules: Vec<FraudRule>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Query filters for rules, exports and audit logs.
#[derive(Debug, Clone, Default)]
pub struct RuleFilters {
    pub rule_type: Option<RuleType>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl RuleFilters {
    pub fn for_type(rule_type: RuleType) -> Self {
        Self {
            rule_type: Some(rule_type),
            ..Default::default()
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(t) = self.rule_type {
            pairs.push(("ruleType", t.as_str().to_string()));
        }
        if let Some(active) = self.is_active {
            pairs.push(("isActive", active.to_string()));
        }
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

/// Who performed an audited action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditActor {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// One entry of the rule change audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub reason: Option<String>,
    pub user: Option<AuditActor>,
    pub created_at: Option<String>,
}

/// List payload of `GET /fraud-rules/audit-logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogPage {
    #[serde(default)]
    pub logs: Vec<AuditLog>,
    #[serde(default)]
    pub pagination: Pagination,
}
