//! Transaction endpoints (`/transactions`).

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::models::{ApiResponse, NewTransaction, Transaction, TransactionFilters, TransactionPage};

use super::{ApiClient, ApiError, RequestAuth};

#[derive(Serialize)]
struct ReviewBody<'a> {
    reason: &'a str,
}

impl ApiClient {
    /// `GET /transactions`
    pub async fn list_transactions(
        &self,
        filters: &TransactionFilters,
    ) -> Result<ApiResponse<TransactionPage>, ApiError> {
        self.get_with_query("/transactions", &filters.query_pairs()).await
    }

    /// `GET /transactions/{id}`
    pub async fn get_transaction(&self, id: i64) -> Result<ApiResponse<Transaction>, ApiError> {
        self.get(&format!("/transactions/{}", id)).await
    }

    /// `POST /transactions` - public submission, always sent without a token.
    pub async fn create_transaction(&self, transaction: &NewTransaction) -> Result<Value, ApiError> {
        self.request(
            Method::POST,
            "/transactions",
            Some(transaction),
            RequestAuth::Anonymous,
        )
        .await
    }

    /// `GET /transactions/stats`
    pub async fn transaction_stats(&self) -> Result<ApiResponse<Value>, ApiError> {
        self.get("/transactions/stats").await
    }

    /// `PATCH /transactions/{id}/approve`
    pub async fn approve_transaction(
        &self,
        id: i64,
        reason: &str,
    ) -> Result<ApiResponse<Transaction>, ApiError> {
        self.patch(&format!("/transactions/{}/approve", id), &ReviewBody { reason })
            .await
    }

    /// `PATCH /transactions/{id}/reject`
    pub async fn reject_transaction(
        &self,
        id: i64,
        reason: &str,
    ) -> Result<ApiResponse<Transaction>, ApiError> {
        self.patch(&format!("/transactions/{}/reject", id), &ReviewBody { reason })
            .await
    }

    /// `GET /transactions/export`
    pub async fn export_transactions(&self, filters: &TransactionFilters) -> Result<Value, ApiError> {
        self.get_with_query("/transactions/export", &filters.query_pairs()).await
    }
}
