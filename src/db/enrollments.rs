use sqlx::PgPool;

use crate::billing::models::Group;

/// The group a student is billed against. Most recent enrollment wins; ties
/// fall back to the newest pivot row.
pub async fn billing_group_for(
    pool: &PgPool,
    student_id: i64,
) -> Result<Option<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        r#"
        SELECT g.id, g.name, g.monthly_fee_cents
        FROM group_student gs
        JOIN groups g ON g.id = gs.group_id
        WHERE gs.student_id = $1
        ORDER BY gs.created_at DESC, gs.id DESC
        LIMIT 1
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await
}
