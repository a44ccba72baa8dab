use std::sync::Arc;

use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config;
use crate::error::BillingError;

use super::adapters::{
    DebtLedger, EnrollmentLookup, NewSettlement, NewSettlementPayment, SettlementReceipt,
    StudentDirectory,
};
use super::models::{DebtStatus, PaymentKind, Student};
use super::period::{BillingPeriod, Clock};

/// Note attached to payments written by the engine.
pub const AUTO_SETTLEMENT_NOTE: &str = "automatic debt settlement";

/// key: debt-reconciliation -> settlement arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub paid_amount_cents: i64,
    pub outstanding_cents: i64,
    pub is_paid: bool,
    pub status: DebtStatus,
}

/// Applies a student's credit balance against the monthly fee.
///
/// Caller guarantees `fee_cents >= 0` and `balance_cents >= 0`. Output
/// amounts are never negative and always satisfy
/// `paid_amount_cents + outstanding_cents == fee_cents`.
pub fn settle(fee_cents: i64, balance_cents: i64) -> Settlement {
    if balance_cents >= fee_cents {
        Settlement {
            paid_amount_cents: fee_cents,
            outstanding_cents: 0,
            is_paid: true,
            status: DebtStatus::Paid,
        }
    } else if balance_cents > 0 {
        Settlement {
            paid_amount_cents: balance_cents,
            outstanding_cents: fee_cents - balance_cents,
            is_paid: false,
            status: DebtStatus::Partial,
        }
    } else {
        Settlement {
            paid_amount_cents: 0,
            outstanding_cents: fee_cents,
            is_paid: false,
            status: DebtStatus::Unpaid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoBillingGroup,
    AlreadyGenerated,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum Outcome {
    Created {
        debt_id: i64,
        payment_id: Option<i64>,
    },
    Skipped {
        reason: SkipReason,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentOutcome {
    pub student_id: i64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// key: debt-reconciliation -> per-run report
///
/// One entry per student considered; the caller decides whether a non-empty
/// failure list warrants alerting.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub run: Uuid,
    pub period: BillingPeriod,
    pub outcomes: Vec<StudentOutcome>,
}

impl GenerationReport {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|entry| predicate(&entry.outcome))
            .count()
    }
}

/// key: debt-reconciliation -> monthly generation batch
///
/// The sole writer of debts, settlement payments and balance debits. Safe to
/// re-run for a period: duplicates are skipped, first via the in-process
/// seen-set and the `exists_for` pre-check, authoritatively via the unique
/// constraint behind `commit_settlement`.
pub struct ReconciliationEngine<S, C> {
    store: Arc<S>,
    clock: C,
    seen: DashMap<(i64, BillingPeriod), ()>,
}

impl<S, C> ReconciliationEngine<S, C>
where
    S: StudentDirectory + EnrollmentLookup + DebtLedger,
    C: Clock,
{
    pub fn new(store: Arc<S>, clock: C) -> Self {
        Self {
            store,
            clock,
            seen: DashMap::new(),
        }
    }

    pub async fn generate_for_current_period(&self) -> Result<GenerationReport, BillingError> {
        self.generate_for_period(self.clock.current_period()).await
    }

    /// Generates one debt per enrolled student for `period`.
    ///
    /// Students are independent units of work: a failure is recorded in the
    /// report and the batch continues. The roster is snapshotted up front;
    /// balance debits re-validate against the committed value inside the
    /// settlement transaction.
    pub async fn generate_for_period(
        &self,
        period: BillingPeriod,
    ) -> Result<GenerationReport, BillingError> {
        let run = Uuid::new_v4();
        let students = self.store.active_students().await?;
        info!(%run, %period, students = students.len(), "debt generation run started");

        let outcomes = stream::iter(students)
            .map(|student| self.settle_student(student, period))
            .buffer_unordered(*config::BILLING_MAX_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        Ok(GenerationReport {
            run,
            period,
            outcomes,
        })
    }

    async fn settle_student(&self, student: Student, period: BillingPeriod) -> StudentOutcome {
        let outcome = match self.try_settle(&student, period).await {
            Ok(receipt) => {
                self.seen.insert((student.id, period), ());
                Outcome::Created {
                    debt_id: receipt.debt_id,
                    payment_id: receipt.payment_id,
                }
            }
            Err(BillingError::NoBillingGroup) => Outcome::Skipped {
                reason: SkipReason::NoBillingGroup,
            },
            Err(BillingError::AlreadyGenerated) => {
                self.seen.insert((student.id, period), ());
                Outcome::Skipped {
                    reason: SkipReason::AlreadyGenerated,
                }
            }
            Err(err) => {
                warn!(student_id = student.id, %period, %err, "settlement failed");
                Outcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        StudentOutcome {
            student_id: student.id,
            outcome,
        }
    }

    async fn try_settle(
        &self,
        student: &Student,
        period: BillingPeriod,
    ) -> Result<SettlementReceipt, BillingError> {
        if self.seen.contains_key(&(student.id, period)) {
            return Err(BillingError::AlreadyGenerated);
        }

        let group = self
            .store
            .billing_group_for(student.id)
            .await?
            .ok_or(BillingError::NoBillingGroup)?;

        if self.store.exists_for(student.id, period).await? {
            return Err(BillingError::AlreadyGenerated);
        }

        if student.balance_cents < 0 {
            return Err(BillingError::NegativeBalance {
                balance_cents: student.balance_cents,
            });
        }

        let settlement = settle(group.monthly_fee_cents, student.balance_cents);
        let payment = (settlement.paid_amount_cents > 0).then(|| NewSettlementPayment {
            amount_cents: settlement.paid_amount_cents,
            date: self.clock.now(),
            note: AUTO_SETTLEMENT_NOTE.to_string(),
            kind: if settlement.is_paid {
                PaymentKind::Balance
            } else {
                PaymentKind::Debt
            },
        });

        self.store
            .commit_settlement(NewSettlement {
                student_id: student.id,
                group_id: group.id,
                month: period,
                amount_cents: settlement.outstanding_cents,
                paid_amount_cents: settlement.paid_amount_cents,
                is_paid: settlement.is_paid,
                status: settlement.status,
                payment,
            })
            .await
    }
}
