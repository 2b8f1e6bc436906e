//! Data models for SMAF API entities.
//!
//! This module contains the structures exchanged with the SMAF REST API:
//!
//! - `User`, `Role`: Console accounts and their permission level
//! - `ApiResponse`, `Pagination`: The `{ success, data, ... }` envelope
//! - `Transaction`, `NewTransaction`: Submitted payments and their review state
//! - `FraudRule`, `RuleType`, `AuditLog`: Rule configuration and its audit trail

pub mod envelope;
pub mod fraud_rule;
pub mod transaction;
pub mod user;

pub use envelope::{ApiResponse, Pagination};
pub use fraud_rule::{AuditLog, AuditLogPage, FraudRule, NewFraudRule, RuleFilters, RulePage, RuleType};
pub use transaction::{NewTransaction, Transaction, TransactionFilters, TransactionPage, TransactionStatus};
pub use user::{Role, User};
