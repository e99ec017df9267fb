//! Role/permission graph maintenance.

use std::collections::BTreeSet;

use sqlx::PgPool;

use crate::db;
use crate::error::AppError;
use crate::models::{PermissionName, RoleName};

/// Grants the super admin role keeps through every role edit.
pub const SUPER_ADMIN_PINNED: [PermissionName; 2] =
    [PermissionName::ManageRoles, PermissionName::ViewPermissions];

pub fn is_pinned(role: RoleName, permission: PermissionName) -> bool {
    role == RoleName::SuperAdmin && SUPER_ADMIN_PINNED.contains(&permission)
}

/// Pinned permissions of `role` absent from the desired permission names.
pub fn missing_pinned<'a>(
    role: RoleName,
    desired: impl IntoIterator<Item = &'a str>,
) -> Vec<PermissionName> {
    let desired: BTreeSet<PermissionName> =
        desired.into_iter().filter_map(|name| name.parse().ok()).collect();

    PermissionName::ALL
        .into_iter()
        .filter(|p| is_pinned(role, *p) && !desired.contains(p))
        .collect()
}

/// The grants and revokes that turn a role's current permission set into
/// the desired one. Permissions in both sets are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionPlan {
    pub grants: Vec<i64>,
    pub revokes: Vec<i64>,
}

impl PermissionPlan {
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty() && self.revokes.is_empty()
    }
}

pub fn plan_permission_changes(current: &[i64], desired: &[i64]) -> PermissionPlan {
    let current: BTreeSet<i64> = current.iter().copied().collect();
    let desired: BTreeSet<i64> = desired.iter().copied().collect();

    PermissionPlan {
        grants: desired.difference(&current).copied().collect(),
        revokes: current.difference(&desired).copied().collect(),
    }
}

/// Moves a role to exactly `desired` permissions inside one transaction.
/// Grants run before revokes so the role never passes through an empty set.
pub async fn set_role_permissions(
    pool: &PgPool,
    role_id: i64,
    desired: &[i64],
) -> Result<PermissionPlan, AppError> {
    let mut tx = pool.begin().await?;

    let current: Vec<i64> = db::role_permissions::permissions_of(&mut *tx, role_id)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let plan = plan_permission_changes(&current, desired);

    for permission_id in &plan.grants {
        db::role_permissions::grant(&mut *tx, role_id, *permission_id).await?;
    }
    for permission_id in &plan.revokes {
        db::role_permissions::revoke(&mut *tx, role_id, *permission_id).await?;
    }

    tx.commit().await?;

    tracing::info!(
        role_id,
        granted = ?plan.grants,
        revoked = ?plan.revokes,
        "Role permissions updated"
    );

    Ok(plan)
}
