use sqlx::PgPool;

use crate::models::{NewUser, RoleName, User, UserUpdate};

/// Prefixes a WHERE/ORDER tail with the joined user projection.
macro_rules! select_users {
    ($tail:literal) => {
        concat!(
            "SELECT u.*, r.name AS role_name, t.name AS team_name
             FROM users u
             JOIN roles r ON r.id = u.role_id
             LEFT JOIN teams t ON t.id = u.team_id ",
            $tail
        )
    };
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user: &NewUser<'_>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash, first_name, last_name, role_id, team_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.role_id)
    .bind(user.team_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(select_users!("WHERE u.email = $1 AND u.is_active"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(select_users!("WHERE u.id = $1 AND u.is_active"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Whether any user, active or not, already holds the email or username.
pub async fn username_taken(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await
}

pub async fn identity_taken(
    pool: &PgPool,
    email: &str,
    username: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM users
             WHERE (email = $1 OR username = $2) AND ($3::BIGINT IS NULL OR id <> $3)
         )",
    )
    .bind(email)
    .bind(username)
    .bind(exclude_id)
    .fetch_one(pool)
    .await
}

pub async fn exists_with_role(pool: &PgPool, role_name: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM users u JOIN roles r ON r.id = u.role_id
             WHERE r.name = $1 AND u.is_active
         )",
    )
    .bind(role_name)
    .fetch_one(pool)
    .await
}

/// Number of users with the given activation state.
pub async fn count_by_status(pool: &PgPool, active: bool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = $1")
        .bind(active)
        .fetch_one(pool)
        .await
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(select_users!(
        "WHERE u.is_active ORDER BY u.created_at DESC, u.id DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn list_inactive(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(select_users!("WHERE NOT u.is_active ORDER BY u.updated_at DESC"))
        .fetch_all(pool)
        .await
}

pub async fn list_by_team(pool: &PgPool, team_id: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(select_users!(
        "WHERE u.team_id = $1 AND u.is_active ORDER BY u.last_name, u.first_name"
    ))
    .bind(team_id)
    .fetch_all(pool)
    .await
}

fn recruitable_roles() -> Vec<&'static str> {
    RoleName::RECRUITABLE.iter().map(|r| r.as_str()).collect()
}

/// Active users without a team whose role lets a leader recruit them.
pub async fn list_team_candidates(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(select_users!(
        "WHERE u.team_id IS NULL AND u.is_active AND r.name = ANY($1)
         ORDER BY u.last_name, u.first_name"
    ))
    .bind(recruitable_roles())
    .fetch_all(pool)
    .await
}

/// Updates profile, role and team of an active user. Returns false when no
/// active user has the id.
pub async fn update(pool: &PgPool, id: i64, fields: &UserUpdate<'_>) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users
         SET username = $2, email = $3, first_name = $4, last_name = $5,
             role_id = $6, team_id = $7, updated_at = now()
         WHERE id = $1 AND is_active",
    )
    .bind(id)
    .bind(fields.username)
    .bind(fields.email)
    .bind(fields.first_name)
    .bind(fields.last_name)
    .bind(fields.role_id)
    .bind(fields.team_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    username: &str,
    first_name: &str,
    last_name: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET username = $2, first_name = $3, last_name = $4, updated_at = now()
         WHERE id = $1 AND is_active",
    )
    .bind(id)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_password(
    pool: &PgPool,
    id: i64,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1 AND is_active",
    )
    .bind(id)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn deactivate(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn restore(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET is_active = TRUE, updated_at = now() WHERE id = $1 AND NOT is_active",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Puts an active, unassigned user into a team.
pub async fn join_team<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    team_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET team_id = $2, updated_at = now()
         WHERE id = $1 AND is_active AND team_id IS NULL",
    )
    .bind(user_id)
    .bind(team_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Recruits a user into a team only if they are active, teamless and hold a
/// recruitable role.
pub async fn recruit(pool: &PgPool, user_id: i64, team_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET team_id = $2, updated_at = now()
         WHERE id = $1 AND is_active AND team_id IS NULL
           AND role_id IN (SELECT id FROM roles WHERE name = ANY($3))",
    )
    .bind(user_id)
    .bind(team_id)
    .bind(recruitable_roles())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes a user from a team only if they are currently in that team.
pub async fn leave_team(pool: &PgPool, user_id: i64, team_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET team_id = NULL, updated_at = now() WHERE id = $1 AND team_id = $2",
    )
    .bind(user_id)
    .bind(team_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
