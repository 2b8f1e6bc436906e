//! Fraud rule endpoints (`/fraud-rules`).
//!
//! Every mutation carries a `reason`, which the server records in the
//! audit trail.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::models::{ApiResponse, AuditLogPage, FraudRule, NewFraudRule, RuleFilters, RulePage, RuleType};

use super::{ApiClient, ApiError, RequestAuth};

/// Number of recent rejections fetched when no limit is given
pub const DEFAULT_RECENT_REJECTIONS: u32 = 10;

#[derive(Serialize)]
struct ReasonBody<'a> {
    reason: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleBody<'a> {
    is_active: bool,
    reason: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportBody<'a> {
    csv_data: &'a [Value],
    rule_type: RuleType,
    reason: &'a str,
}

impl ApiClient {
    /// `GET /fraud-rules`
    pub async fn list_rules(&self, filters: &RuleFilters) -> Result<ApiResponse<RulePage>, ApiError> {
        self.get_with_query("/fraud-rules", &filters.query_pairs()).await
    }

    /// `GET /fraud-rules/{id}`
    pub async fn get_rule(&self, id: i64) -> Result<ApiResponse<FraudRule>, ApiError> {
        self.get(&format!("/fraud-rules/{}", id)).await
    }

    /// `POST /fraud-rules`
    pub async fn create_rule(&self, rule: &NewFraudRule) -> Result<ApiResponse<FraudRule>, ApiError> {
        self.post("/fraud-rules", rule).await
    }

    /// `PUT /fraud-rules/{id}`
    pub async fn update_rule(
        &self,
        id: i64,
        rule: &NewFraudRule,
    ) -> Result<ApiResponse<FraudRule>, ApiError> {
        self.put(&format!("/fraud-rules/{}", id), rule).await
    }

    /// `DELETE /fraud-rules/{id}` with the reason in the body.
    pub async fn delete_rule(&self, id: i64, reason: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.delete(&format!("/fraud-rules/{}", id), Some(&ReasonBody { reason }))
            .await
    }

    /// `PATCH /fraud-rules/{id}/toggle`
    pub async fn toggle_rule(
        &self,
        id: i64,
        is_active: bool,
        reason: &str,
    ) -> Result<ApiResponse<FraudRule>, ApiError> {
        self.request(
            Method::PATCH,
            &format!("/fraud-rules/{}/toggle", id),
            Some(&ToggleBody { is_active, reason }),
            RequestAuth::Stored,
        )
        .await
    }

    /// `POST /fraud-rules/import` with already parsed CSV rows.
    pub async fn import_rules(
        &self,
        csv_data: &[Value],
        rule_type: RuleType,
        reason: &str,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let body = ImportBody {
            csv_data,
            rule_type,
            reason,
        };
        self.post("/fraud-rules/import", &body).await
    }

    /// `GET /fraud-rules/export`
    pub async fn export_rules(&self, filters: &RuleFilters) -> Result<ApiResponse<Value>, ApiError> {
        self.get_with_query("/fraud-rules/export", &filters.query_pairs()).await
    }

    /// `GET /fraud-rules/audit-logs`
    pub async fn audit_logs(&self, filters: &RuleFilters) -> Result<ApiResponse<AuditLogPage>, ApiError> {
        self.get_with_query("/fraud-rules/audit-logs", &filters.query_pairs()).await
    }

    /// `GET /fraud-rules/audit-logs/stats`
    pub async fn audit_log_stats(&self, filters: &RuleFilters) -> Result<ApiResponse<Value>, ApiError> {
        self.get_with_query("/fraud-rules/audit-logs/stats", &filters.query_pairs()).await
    }

    /// `GET /fraud-rules/stats`
    pub async fn rule_stats(&self) -> Result<ApiResponse<Value>, ApiError> {
        self.get("/fraud-rules/stats").await
    }

    /// `GET /fraud-rules/rejections/stats`
    pub async fn rejection_stats(&self, filters: &RuleFilters) -> Result<ApiResponse<Value>, ApiError> {
        self.get_with_query("/fraud-rules/rejections/stats", &filters.query_pairs()).await
    }

    /// `GET /fraud-rules/rejections/dashboard`
    pub async fn dashboard_rejections(&self) -> Result<ApiResponse<Value>, ApiError> {
        self.get("/fraud-rules/rejections/dashboard").await
    }

    /// `GET /fraud-rules/rejections/recent`
    pub async fn recent_rejections(&self, limit: Option<u32>) -> Result<ApiResponse<Value>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_REJECTIONS);
        self.get_with_query("/fraud-rules/rejections/recent", &[("limit", limit.to_string())])
            .await
    }
}
