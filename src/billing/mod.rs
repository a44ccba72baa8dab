pub mod adapters;
pub mod models;
pub mod period;
pub mod reconciliation;
pub mod scheduler;

pub use adapters::{
    DebtLedger, EnrollmentLookup, NewSettlement, NewSettlementPayment, SettlementReceipt,
    StudentDirectory,
};
pub use models::{Debt, DebtStatus, Group, Payment, PaymentKind, Student};
pub use period::{BillingPeriod, Clock, FixedClock, SystemClock};
pub use reconciliation::{
    settle, GenerationReport, Outcome, ReconciliationEngine, Settlement, SkipReason,
    StudentOutcome, AUTO_SETTLEMENT_NOTE,
};
pub use scheduler::{
    process_tick as run_debt_generation_tick, spawn as spawn_debt_generation_scheduler,
};
