#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tuition_billing::billing::adapters::{
    DebtLedger, EnrollmentLookup, NewSettlement, SettlementReceipt, StudentDirectory,
};
use tuition_billing::billing::models::{Debt, Group, Payment, Student};
use tuition_billing::billing::period::BillingPeriod;
use tuition_billing::error::BillingError;

struct Enrollment {
    student_id: i64,
    group_id: i64,
    created_at: DateTime<Utc>,
}

struct State {
    students: Vec<Student>,
    groups: HashMap<i64, Group>,
    enrollments: Vec<Enrollment>,
    debts: Vec<Debt>,
    payments: Vec<Payment>,
    fail_commit_for: HashSet<i64>,
    next_debt_id: i64,
    next_payment_id: i64,
}

/// In-memory collaborator double. One mutex acquisition per commit stands in
/// for the per-student transaction: check, debit and writes happen under a
/// single lock, so concurrent engines observe the same atomicity the
/// Postgres store provides.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                students: Vec::new(),
                groups: HashMap::new(),
                enrollments: Vec::new(),
                debts: Vec::new(),
                payments: Vec::new(),
                fail_commit_for: HashSet::new(),
                next_debt_id: 1,
                next_payment_id: 1,
            }),
        }
    }

    pub fn add_student(&self, id: i64, full_name: &str, balance_cents: i64) {
        self.state.lock().unwrap().students.push(Student {
            id,
            full_name: full_name.to_string(),
            phone: None,
            balance_cents,
        });
    }

    pub fn add_group(&self, id: i64, name: &str, monthly_fee_cents: i64) {
        self.state.lock().unwrap().groups.insert(
            id,
            Group {
                id,
                name: name.to_string(),
                monthly_fee_cents,
            },
        );
    }

    pub fn enroll(&self, student_id: i64, group_id: i64, created_at: DateTime<Utc>) {
        self.state.lock().unwrap().enrollments.push(Enrollment {
            student_id,
            group_id,
            created_at,
        });
    }

    /// Makes every settlement commit for `student_id` fail with a storage
    /// error, leaving no state behind.
    pub fn fail_commit_for(&self, student_id: i64) {
        self.state.lock().unwrap().fail_commit_for.insert(student_id);
    }

    pub fn student_balance(&self, student_id: i64) -> i64 {
        self.state
            .lock()
            .unwrap()
            .students
            .iter()
            .find(|student| student.id == student_id)
            .map(|student| student.balance_cents)
            .expect("student registered")
    }

    pub fn debts(&self) -> Vec<Debt> {
        self.state.lock().unwrap().debts.clone()
    }

    pub fn debt_for(&self, student_id: i64, month: BillingPeriod) -> Option<Debt> {
        self.state
            .lock()
            .unwrap()
            .debts
            .iter()
            .find(|debt| debt.student_id == student_id && debt.month == month)
            .cloned()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.state.lock().unwrap().payments.clone()
    }

    pub fn payments_for(&self, student_id: i64) -> Vec<Payment> {
        self.state
            .lock()
            .unwrap()
            .payments
            .iter()
            .filter(|payment| payment.student_id == student_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl StudentDirectory for MemoryStore {
    async fn active_students(&self) -> Result<Vec<Student>, BillingError> {
        Ok(self.state.lock().unwrap().students.clone())
    }
}

#[async_trait]
impl EnrollmentLookup for MemoryStore {
    async fn billing_group_for(&self, student_id: i64) -> Result<Option<Group>, BillingError> {
        let state = self.state.lock().unwrap();
        let latest = state
            .enrollments
            .iter()
            .enumerate()
            .filter(|(_, enrollment)| enrollment.student_id == student_id)
            .max_by_key(|(index, enrollment)| (enrollment.created_at, *index));
        Ok(latest.and_then(|(_, enrollment)| state.groups.get(&enrollment.group_id).cloned()))
    }
}

#[async_trait]
impl DebtLedger for MemoryStore {
    async fn exists_for(
        &self,
        student_id: i64,
        month: BillingPeriod,
    ) -> Result<bool, BillingError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .debts
            .iter()
            .any(|debt| debt.student_id == student_id && debt.month == month))
    }

    async fn commit_settlement(
        &self,
        settlement: NewSettlement,
    ) -> Result<SettlementReceipt, BillingError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_commit_for.contains(&settlement.student_id) {
            return Err(BillingError::Db(sqlx::Error::Protocol(
                "simulated write failure".into(),
            )));
        }

        // The unique-constraint stand-in: checked under the same lock that
        // performs the writes.
        if state
            .debts
            .iter()
            .any(|debt| debt.student_id == settlement.student_id && debt.month == settlement.month)
        {
            return Err(BillingError::AlreadyGenerated);
        }

        if settlement.paid_amount_cents > 0 {
            let student = state
                .students
                .iter_mut()
                .find(|student| student.id == settlement.student_id)
                .expect("student registered");
            if student.balance_cents < settlement.paid_amount_cents {
                return Err(BillingError::InsufficientBalance {
                    requested_cents: settlement.paid_amount_cents,
                    available_cents: student.balance_cents,
                });
            }
            student.balance_cents -= settlement.paid_amount_cents;
        }

        let debt_id = state.next_debt_id;
        state.next_debt_id += 1;
        state.debts.push(Debt {
            id: debt_id,
            student_id: settlement.student_id,
            group_id: settlement.group_id,
            month: settlement.month,
            amount_cents: settlement.amount_cents,
            paid_amount_cents: settlement.paid_amount_cents,
            is_paid: settlement.is_paid,
            status: settlement.status,
            created_at: settlement
                .payment
                .as_ref()
                .map(|payment| payment.date)
                .unwrap_or_else(Utc::now),
        });

        let payment_id = settlement.payment.as_ref().map(|payment| {
            let id = state.next_payment_id;
            state.next_payment_id += 1;
            state.payments.push(Payment {
                id,
                student_id: settlement.student_id,
                amount_cents: payment.amount_cents,
                date: payment.date,
                note: payment.note.clone(),
                kind: payment.kind,
                debt_id: Some(debt_id),
            });
            id
        });

        Ok(SettlementReceipt {
            debt_id,
            payment_id,
        })
    }
}
