use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::{RoleName, User};

/// The caller as resolved by the authentication gate on this request. The
/// role is read from the store, never from the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub role: RoleName,
    pub role_id: i64,
    pub team_id: Option<i64>,
}

impl AuthenticatedIdentity {
    pub fn from_user(user: &User) -> Result<Self, AppError> {
        let role = user.role_name.parse::<RoleName>().map_err(|e| {
            tracing::warn!(user_id = user.id, "Rejecting identity: {e}");
            AppError::Authentication("Unknown role".to_string())
        })?;

        Ok(Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name(),
            role,
            role_id: user.role_id,
            team_id: user.team_id,
        })
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == RoleName::SuperAdmin
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!(
                    path = %parts.uri.path(),
                    "Handler reached without an authenticated identity"
                );
                AppError::Forbidden("Access denied".to_string())
            })
    }
}
