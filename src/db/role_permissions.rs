use sqlx::PgPool;

use crate::models::{Permission, Role};

pub async fn permissions_of<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    role_id: i64,
) -> Result<Vec<Permission>, sqlx::Error> {
    sqlx::query_as::<_, Permission>(
        "SELECT p.* FROM permissions p
         JOIN role_permissions rp ON rp.permission_id = p.id
         WHERE rp.role_id = $1
         ORDER BY p.name",
    )
    .bind(role_id)
    .fetch_all(executor)
    .await
}

pub async fn roles_of(pool: &PgPool, permission_id: i64) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>(
        "SELECT r.* FROM roles r
         JOIN role_permissions rp ON rp.role_id = r.id
         WHERE rp.permission_id = $1
         ORDER BY r.id",
    )
    .bind(permission_id)
    .fetch_all(pool)
    .await
}

/// Adds the pair. Returns false when it was already present.
pub async fn grant<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    role_id: i64,
    permission_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)
         ON CONFLICT (role_id, permission_id) DO NOTHING",
    )
    .bind(role_id)
    .bind(permission_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes the pair. Returns false when it was not present.
pub async fn revoke<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    role_id: i64,
    permission_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2",
    )
    .bind(role_id)
    .bind(permission_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn role_has_permission(
    pool: &PgPool,
    role_name: &str,
    permission_name: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM role_permissions rp
             JOIN roles r ON r.id = rp.role_id
             JOIN permissions p ON p.id = rp.permission_id
             WHERE r.name = $1 AND p.name = $2
         )",
    )
    .bind(role_name)
    .bind(permission_name)
    .fetch_one(pool)
    .await
}

pub async fn permission_names_of_role(
    pool: &PgPool,
    role_name: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT p.name FROM permissions p
         JOIN role_permissions rp ON rp.permission_id = p.id
         JOIN roles r ON r.id = rp.role_id
         WHERE r.name = $1
         ORDER BY p.name",
    )
    .bind(role_name)
    .fetch_all(pool)
    .await
}
