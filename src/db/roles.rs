use sqlx::PgPool;

use crate::models::Role;

pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM roles").fetch_one(pool).await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_name<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
        .bind(name)
        .fetch_optional(executor)
        .await
}

pub async fn update_description<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i64,
    description: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE roles SET description = $2 WHERE id = $1")
        .bind(id)
        .bind(description)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
