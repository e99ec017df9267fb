//! Credential store: user records with salted password hashes.

use sqlx::PgPool;

use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::models::{NewUser, User, UserUpdate};

pub const DUPLICATE_IDENTITY: &str = "User with this email or username already exists";

/// Raw fields for a new credential. The password is plaintext until hashed here.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role_id: i64,
    pub team_id: Option<i64>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn create(pool: &PgPool, candidate: &Candidate<'_>) -> Result<i64, AppError> {
    let email = normalize_email(candidate.email);
    let username = candidate.username.trim();

    if db::users::identity_taken(pool, &email, username, None).await? {
        return Err(AppError::Validation(DUPLICATE_IDENTITY.to_string()));
    }

    let password_hash = password::hash(candidate.password).map_err(AppError::Internal)?;

    let new_user = NewUser {
        username,
        email: &email,
        password_hash: &password_hash,
        first_name: candidate.first_name.trim(),
        last_name: candidate.last_name.trim(),
        role_id: candidate.role_id,
        team_id: candidate.team_id,
    };

    db::users::create(pool, &new_user).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            AppError::Validation(DUPLICATE_IDENTITY.to_string())
        } else {
            AppError::Database(e)
        }
    })
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    Ok(db::users::find_by_email(pool, &normalize_email(email)).await?)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    Ok(db::users::find_by_id(pool, id).await?)
}

/// Checks an email/password pair. Unknown emails and wrong passwords are
/// indistinguishable to the caller.
pub async fn authenticate(
    pool: &PgPool,
    email: &str,
    plain: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = find_by_email(pool, email).await? else {
        password::verify_dummy(plain);
        return Ok(None);
    };

    let valid = password::verify(plain, &user.password_hash).map_err(AppError::Internal)?;
    Ok(valid.then_some(user))
}

/// Updates profile, role and team. Returns false when no active user has the id.
pub async fn update(pool: &PgPool, id: i64, fields: &UserUpdate<'_>) -> Result<bool, AppError> {
    let email = normalize_email(fields.email);
    let username = fields.username.trim();

    if db::users::identity_taken(pool, &email, username, Some(id)).await? {
        return Err(AppError::Validation(DUPLICATE_IDENTITY.to_string()));
    }

    let fields = UserUpdate {
        username,
        email: &email,
        first_name: fields.first_name.trim(),
        last_name: fields.last_name.trim(),
        ..fields.clone()
    };

    db::users::update(pool, id, &fields).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            AppError::Validation(DUPLICATE_IDENTITY.to_string())
        } else {
            AppError::Database(e)
        }
    })
}

pub async fn change_secret(pool: &PgPool, id: i64, new_plain: &str) -> Result<bool, AppError> {
    let password_hash = password::hash(new_plain).map_err(AppError::Internal)?;
    Ok(db::users::update_password(pool, id, &password_hash).await?)
}

pub async fn deactivate(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    Ok(db::users::deactivate(pool, id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_compared_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
