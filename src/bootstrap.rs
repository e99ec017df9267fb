//! First-start provisioning of a super admin account.

use sqlx::PgPool;

use crate::auth::credentials::{self, Candidate};
use crate::config::BootstrapAdmin;
use crate::db;
use crate::error::AppError;
use crate::models::RoleName;
use crate::routes::auth::{is_valid_email, validate_new_password};

/// Attempts at a free username before giving up.
const USERNAME_ATTEMPTS: u32 = 20;

/// Creates the configured super admin unless an active one already exists.
/// Returns the new user id when an account was created.
pub async fn ensure_super_admin(
    pool: &PgPool,
    admin: &BootstrapAdmin,
) -> Result<Option<i64>, AppError> {
    if db::users::exists_with_role(pool, RoleName::SuperAdmin.as_str()).await? {
        tracing::debug!("Super admin present, skipping bootstrap");
        return Ok(None);
    }

    if !is_valid_email(&admin.email) {
        return Err(AppError::Configuration(format!(
            "Bootstrap admin email '{}' is not a valid address",
            admin.email
        )));
    }
    validate_new_password(&admin.password, &admin.password)
        .map_err(|msg| AppError::Configuration(format!("Bootstrap admin password: {msg}")))?;

    let role = db::roles::find_by_name(pool, RoleName::SuperAdmin.as_str())
        .await?
        .ok_or_else(|| AppError::Configuration("Role 'super_admin' is not seeded".to_string()))?;

    let local = admin
        .email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or("superadmin");
    let username = free_username(pool, local).await?;

    let candidate = Candidate {
        username: &username,
        email: &admin.email,
        password: &admin.password,
        first_name: "Super",
        last_name: "Admin",
        role_id: role.id,
        team_id: None,
    };

    let id = credentials::create(pool, &candidate).await?;
    tracing::info!(user_id = id, email = %admin.email, "Bootstrapped super admin");
    Ok(Some(id))
}

/// First of `base`, `base1`, `base2`, ... that no user holds yet.
async fn free_username(pool: &PgPool, base: &str) -> Result<String, AppError> {
    for n in 0..USERNAME_ATTEMPTS {
        let username = match n {
            0 => base.to_string(),
            n => format!("{base}{n}"),
        };
        if !db::users::username_taken(pool, &username).await? {
            return Ok(username);
        }
    }
    Err(AppError::Configuration(format!(
        "No free username derived from '{base}' for the bootstrap admin"
    )))
}
