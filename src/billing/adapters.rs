use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::BillingError;

use super::models::{DebtStatus, Group, PaymentKind, Student};
use super::period::BillingPeriod;

/// Atomic write request for one student's settlement: the debt row plus the
/// balance debit and the payment entry that go with it.
#[derive(Debug, Clone)]
pub struct NewSettlement {
    pub student_id: i64,
    pub group_id: i64,
    pub month: BillingPeriod,
    pub amount_cents: i64,
    pub paid_amount_cents: i64,
    pub is_paid: bool,
    pub status: DebtStatus,
    pub payment: Option<NewSettlementPayment>,
}

#[derive(Debug, Clone)]
pub struct NewSettlementPayment {
    pub amount_cents: i64,
    pub date: DateTime<Utc>,
    pub note: String,
    pub kind: PaymentKind,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SettlementReceipt {
    pub debt_id: i64,
    pub payment_id: Option<i64>,
}

/// key: billing-stores -> roster snapshot
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    /// Students considered for the run, balances as committed at call time.
    async fn active_students(&self) -> Result<Vec<Student>, BillingError>;
}

/// key: billing-stores -> billing group resolution
#[async_trait]
pub trait EnrollmentLookup: Send + Sync {
    /// The group a student is billed against, or `None` when unenrolled.
    /// Most recent enrollment wins when a student sits in several groups.
    async fn billing_group_for(&self, student_id: i64) -> Result<Option<Group>, BillingError>;
}

/// key: billing-stores -> debts and the atomic settlement write path
#[async_trait]
pub trait DebtLedger: Send + Sync {
    /// Fast-path duplicate check; the storage-level unique constraint on
    /// (student, month) remains the authority.
    async fn exists_for(&self, student_id: i64, month: BillingPeriod)
        -> Result<bool, BillingError>;

    /// Balance debit + debt insert + optional payment insert, all-or-nothing.
    /// Fails with `AlreadyGenerated` on a (student, month) conflict and with
    /// `InsufficientBalance` when the committed balance no longer covers the
    /// debit; neither leaves partial state behind.
    async fn commit_settlement(
        &self,
        settlement: NewSettlement,
    ) -> Result<SettlementReceipt, BillingError>;
}
