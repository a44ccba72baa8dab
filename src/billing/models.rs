use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

use super::period::BillingPeriod;

/// key: billing-models -> students,groups,debts,payments
///
/// Monetary columns are integer minor units with 2-digit precision; the
/// `_cents` suffix marks them throughout the crate.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub full_name: String,
    pub phone: Option<String>,
    pub balance_cents: i64,
}

/// key: billing-models -> group with the fee authoritative for the period
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub monthly_fee_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    Unpaid,
    Partial,
    Paid,
}

impl DebtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtStatus::Unpaid => "unpaid",
            DebtStatus::Partial => "partial",
            DebtStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unrecognized debt status '{0}'")]
pub struct ParseDebtStatusError(String);

impl FromStr for DebtStatus {
    type Err = ParseDebtStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unpaid" => Ok(DebtStatus::Unpaid),
            "partial" => Ok(DebtStatus::Partial),
            "paid" => Ok(DebtStatus::Paid),
            other => Err(ParseDebtStatusError(other.to_string())),
        }
    }
}

/// One student's obligation for one billing period.
///
/// Invariant at creation: `amount_cents + paid_amount_cents` equals the
/// group's monthly fee. Created exactly once per (student, month); the
/// unique index on `debts` enforces it.
#[derive(Debug, Clone, Serialize)]
pub struct Debt {
    pub id: i64,
    pub student_id: i64,
    pub group_id: i64,
    pub month: BillingPeriod,
    pub amount_cents: i64,
    pub paid_amount_cents: i64,
    pub is_paid: bool,
    pub status: DebtStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// Partial settlement against an outstanding debt.
    Debt,
    /// Full settlement covered by the student's credit balance.
    Balance,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Debt => "debt",
            PaymentKind::Balance => "balance",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unrecognized payment type '{0}'")]
pub struct ParsePaymentKindError(String);

impl FromStr for PaymentKind {
    type Err = ParsePaymentKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "debt" => Ok(PaymentKind::Debt),
            "balance" => Ok(PaymentKind::Balance),
            other => Err(ParsePaymentKindError(other.to_string())),
        }
    }
}

/// Append-only ledger entry. Never mutated or deleted once written.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: i64,
    pub student_id: i64,
    pub amount_cents: i64,
    pub date: DateTime<Utc>,
    pub note: String,
    pub kind: PaymentKind,
    pub debt_id: Option<i64>,
}
