use thiserror::Error;

/// key: billing-errors -> per-student failure taxonomy
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("student has no billing group")]
    NoBillingGroup,
    #[error("debt already generated for this student and month")]
    AlreadyGenerated,
    #[error("balance ledger refused debit of {requested_cents} ({available_cents} available)")]
    InsufficientBalance {
        requested_cents: i64,
        available_cents: i64,
    },
    #[error("student balance is negative: {balance_cents}")]
    NegativeBalance { balance_cents: i64 },
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

pub type BillingResult<T> = Result<T, BillingError>;
