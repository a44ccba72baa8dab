use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use crate::billing::adapters::NewSettlementPayment;
use crate::billing::models::Payment;

pub async fn insert_payment(
    conn: &mut PgConnection,
    student_id: i64,
    debt_id: Option<i64>,
    payment: &NewSettlementPayment,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO payments (student_id, amount_cents, date, note, type, debt_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(student_id)
    .bind(payment.amount_cents)
    .bind(payment.date)
    .bind(&payment.note)
    .bind(payment.kind.as_str())
    .bind(debt_id)
    .fetch_one(conn)
    .await
}

pub async fn list_for_student(
    pool: &PgPool,
    student_id: i64,
) -> Result<Vec<Payment>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, student_id, amount_cents, date, note, type, debt_id
        FROM payments
        WHERE student_id = $1
        ORDER BY id
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_row).collect()
}

fn map_row(row: &PgRow) -> Result<Payment, sqlx::Error> {
    let kind: String = row.get("type");
    Ok(Payment {
        id: row.get("id"),
        student_id: row.get("student_id"),
        amount_cents: row.get("amount_cents"),
        date: row.get("date"),
        note: row.get("note"),
        kind: kind.parse().map_err(|err| sqlx::Error::ColumnDecode {
            index: "type".into(),
            source: Box::new(err),
        })?,
        debt_id: row.get("debt_id"),
    })
}
