use sqlx::{PgConnection, PgPool};

use crate::billing::models::Student;

pub async fn list_students(pool: &PgPool) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        SELECT id, full_name, phone, balance_cents
        FROM students
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_student(pool: &PgPool, student_id: i64) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        SELECT id, full_name, phone, balance_cents
        FROM students
        WHERE id = $1
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

/// Conditional debit against the committed balance. Returns `false` when the
/// balance no longer covers `amount_cents`; the caller rolls back.
pub async fn debit_balance(
    conn: &mut PgConnection,
    student_id: i64,
    amount_cents: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE students
        SET balance_cents = balance_cents - $2, updated_at = NOW()
        WHERE id = $1 AND balance_cents >= $2
        "#,
    )
    .bind(student_id)
    .bind(amount_cents)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
