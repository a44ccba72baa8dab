use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use crate::billing::adapters::NewSettlement;
use crate::billing::models::Debt;
use crate::billing::period::BillingPeriod;

pub async fn exists_for(
    pool: &PgPool,
    student_id: i64,
    month: BillingPeriod,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM debts WHERE student_id = $1 AND month = $2)",
    )
    .bind(student_id)
    .bind(month.to_string())
    .fetch_one(pool)
    .await
}

/// Insert guarded by the (student_id, month) unique index. `None` means a
/// debt for this month already exists and nothing was written.
pub async fn insert_debt(
    conn: &mut PgConnection,
    settlement: &NewSettlement,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO debts (student_id, group_id, month, amount_cents, paid_amount_cents, is_paid, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (student_id, month) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(settlement.student_id)
    .bind(settlement.group_id)
    .bind(settlement.month.to_string())
    .bind(settlement.amount_cents)
    .bind(settlement.paid_amount_cents)
    .bind(settlement.is_paid)
    .bind(settlement.status.as_str())
    .fetch_optional(conn)
    .await
}

pub async fn list_for_month(pool: &PgPool, month: BillingPeriod) -> Result<Vec<Debt>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, student_id, group_id, month, amount_cents, paid_amount_cents, is_paid, status, created_at
        FROM debts
        WHERE month = $1
        ORDER BY id
        "#,
    )
    .bind(month.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_row).collect()
}

fn map_row(row: &PgRow) -> Result<Debt, sqlx::Error> {
    let month: String = row.get("month");
    let status: String = row.get("status");
    Ok(Debt {
        id: row.get("id"),
        student_id: row.get("student_id"),
        group_id: row.get("group_id"),
        month: month.parse().map_err(|err| sqlx::Error::ColumnDecode {
            index: "month".into(),
            source: Box::new(err),
        })?,
        amount_cents: row.get("amount_cents"),
        paid_amount_cents: row.get("paid_amount_cents"),
        is_paid: row.get("is_paid"),
        status: status.parse().map_err(|err| sqlx::Error::ColumnDecode {
            index: "status".into(),
            source: Box::new(err),
        })?,
        created_at: row.get("created_at"),
    })
}
