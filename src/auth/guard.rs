use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::identity::AuthenticatedIdentity;
use crate::db;
use crate::error::AppError;
use crate::models::{PermissionName, RoleName};
use crate::state::SharedState;

/// Roles allowed through an authorization layer.
#[derive(Debug, Clone)]
pub struct RoleSet(Arc<[RoleName]>);

impl RoleSet {
    pub fn contains(&self, role: RoleName) -> bool {
        self.0.contains(&role)
    }

    /// Passes when an identity is present and its role is in the set. A
    /// missing identity is denied.
    pub fn check(&self, identity: Option<&AuthenticatedIdentity>) -> Result<(), AppError> {
        let Some(identity) = identity else {
            tracing::error!("Authorization checked before authentication; denying");
            return Err(AppError::Forbidden("Access denied".to_string()));
        };

        if self.contains(identity.role) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = identity.id,
                role = %identity.role,
                "Authorization denied"
            );
            Err(AppError::Forbidden(format!(
                "You do not have permission to access this resource. \
                 Required role: {}. Your role: {}",
                self.describe(),
                identity.role
            )))
        }
    }

    fn describe(&self) -> String {
        self.0
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn require_any_role(roles: impl IntoIterator<Item = RoleName>) -> RoleSet {
    let mut roles: Vec<RoleName> = roles.into_iter().collect();
    roles.sort();
    roles.dedup();
    RoleSet(roles.into())
}

pub fn require_role(role: RoleName) -> RoleSet {
    require_any_role([role])
}

/// Middleware enforcing a [`RoleSet`]. Must sit inside the authentication layer.
pub async fn authorize(
    State(allowed): State<RoleSet>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    allowed.check(req.extensions().get::<AuthenticatedIdentity>())?;
    Ok(next.run(req).await)
}

/// A permission the caller's current role must hold.
#[derive(Clone)]
pub struct PermissionRequirement {
    state: SharedState,
    permission: PermissionName,
}

pub fn require_permission(
    state: &SharedState,
    permission: PermissionName,
) -> PermissionRequirement {
    PermissionRequirement {
        state: state.clone(),
        permission,
    }
}

/// Middleware consulting the role/permission graph for the caller's role.
pub async fn authorize_permission(
    State(requirement): State<PermissionRequirement>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(identity) = req.extensions().get::<AuthenticatedIdentity>() else {
        tracing::error!("Permission checked before authentication; denying");
        return Err(AppError::Forbidden("Access denied".to_string()));
    };

    let granted = db::role_permissions::role_has_permission(
        &requirement.state.pool,
        identity.role.as_str(),
        requirement.permission.as_str(),
    )
    .await?;

    if !granted {
        tracing::warn!(
            user_id = identity.id,
            role = %identity.role,
            permission = %requirement.permission,
            "Permission denied"
        );
        return Err(AppError::Forbidden(format!(
            "Your role does not hold the '{}' permission",
            requirement.permission
        )));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: RoleName) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            id: 1,
            email: "a@example.com".to_string(),
            username: "a".to_string(),
            full_name: "A B".to_string(),
            role,
            role_id: 1,
            team_id: None,
        }
    }

    #[test]
    fn member_role_passes() {
        let allowed = require_any_role([RoleName::Admin, RoleName::SuperAdmin]);
        assert!(allowed.check(Some(&identity(RoleName::Admin))).is_ok());
        assert!(allowed.check(Some(&identity(RoleName::SuperAdmin))).is_ok());
    }

    #[test]
    fn other_roles_are_forbidden() {
        let allowed = require_role(RoleName::SuperAdmin);
        for role in [
            RoleName::Admin,
            RoleName::TeamLeader,
            RoleName::TeamMember,
            RoleName::IndividualUser,
        ] {
            assert!(matches!(
                allowed.check(Some(&identity(role))),
                Err(AppError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn missing_identity_fails_closed() {
        let allowed = require_any_role(RoleName::ALL);
        assert!(matches!(allowed.check(None), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn duplicate_roles_collapse() {
        let allowed = require_any_role([RoleName::Admin, RoleName::Admin]);
        assert_eq!(allowed.0.len(), 1);
        assert!(!allowed.contains(RoleName::TeamLeader));
    }
}
