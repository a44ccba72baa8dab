pub mod debts;
pub mod enrollments;
pub mod payments;
pub mod students;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::billing::adapters::{
    DebtLedger, EnrollmentLookup, NewSettlement, SettlementReceipt, StudentDirectory,
};
use crate::billing::models::{Group, Student};
use crate::billing::period::BillingPeriod;
use crate::error::BillingError;

/// key: billing-stores-pg -> sqlx-backed store facade
///
/// Implements the store traits over Postgres. The settlement write path runs
/// debit + debt insert + payment insert in one transaction; the unique index
/// on debts (student_id, month) is the duplicate-prevention authority.
#[derive(Clone)]
pub struct PgBillingStore {
    pool: PgPool,
}

impl PgBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StudentDirectory for PgBillingStore {
    async fn active_students(&self) -> Result<Vec<Student>, BillingError> {
        Ok(students::list_students(&self.pool).await?)
    }
}

#[async_trait]
impl EnrollmentLookup for PgBillingStore {
    async fn billing_group_for(&self, student_id: i64) -> Result<Option<Group>, BillingError> {
        Ok(enrollments::billing_group_for(&self.pool, student_id).await?)
    }
}

#[async_trait]
impl DebtLedger for PgBillingStore {
    async fn exists_for(
        &self,
        student_id: i64,
        month: BillingPeriod,
    ) -> Result<bool, BillingError> {
        Ok(debts::exists_for(&self.pool, student_id, month).await?)
    }

    async fn commit_settlement(
        &self,
        settlement: NewSettlement,
    ) -> Result<SettlementReceipt, BillingError> {
        let mut tx = self.pool.begin().await?;

        // Debt insert first: a (student, month) conflict must surface before
        // any balance is touched.
        let debt_id = match debts::insert_debt(&mut tx, &settlement).await? {
            Some(id) => id,
            None => {
                tx.rollback().await?;
                return Err(BillingError::AlreadyGenerated);
            }
        };

        if settlement.paid_amount_cents > 0 {
            let debited =
                students::debit_balance(&mut tx, settlement.student_id, settlement.paid_amount_cents)
                    .await?;
            if !debited {
                tx.rollback().await?;
                let available = students::get_student(&self.pool, settlement.student_id)
                    .await?
                    .map(|student| student.balance_cents)
                    .unwrap_or(0);
                return Err(BillingError::InsufficientBalance {
                    requested_cents: settlement.paid_amount_cents,
                    available_cents: available,
                });
            }
        }

        let payment_id = match &settlement.payment {
            Some(payment) => Some(
                payments::insert_payment(&mut tx, settlement.student_id, Some(debt_id), payment)
                    .await?,
            ),
            None => None,
        };

        tx.commit().await?;

        Ok(SettlementReceipt {
            debt_id,
            payment_id,
        })
    }
}
