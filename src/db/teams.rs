use sqlx::PgPool;

use crate::models::Team;

macro_rules! select_teams {
    ($tail:literal) => {
        concat!(
            "SELECT t.id, t.name, t.description, t.leader_id, l.username AS leader_username,
                    (SELECT COUNT(*) FROM users m
                     WHERE m.team_id = t.id AND m.is_active) AS member_count,
                    t.created_at
             FROM teams t
             LEFT JOIN users l ON l.id = t.leader_id ",
            $tail
        )
    };
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
    description: Option<&str>,
    leader_id: Option<i64>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO teams (name, description, leader_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(description)
    .bind(leader_id)
    .fetch_one(executor)
    .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(select_teams!("ORDER BY t.name"))
        .fetch_all(pool)
        .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM teams").fetch_one(pool).await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(select_teams!("WHERE t.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_led_by(pool: &PgPool, leader_id: i64) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(select_teams!("WHERE t.leader_id = $1 ORDER BY t.id LIMIT 1"))
        .bind(leader_id)
        .fetch_optional(pool)
        .await
}
