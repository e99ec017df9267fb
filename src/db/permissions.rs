use sqlx::PgPool;

use crate::models::Permission;

pub async fn list(pool: &PgPool) -> Result<Vec<Permission>, sqlx::Error> {
    sqlx::query_as::<_, Permission>("SELECT * FROM permissions ORDER BY name")
        .fetch_all(pool)
        .await
}
