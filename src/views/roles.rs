use std::collections::BTreeSet;

use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::auth::AuthenticatedIdentity;
use crate::db;
use crate::error::AppError;
use crate::models::{PermissionName, Role};
use crate::rbac;
use crate::state::SharedState;
use crate::views::Nav;

#[derive(Template)]
#[template(path = "super_admin/roles.html")]
struct RolesTemplate {
    nav: Option<Nav>,
    roles: Vec<RoleRow>,
}

struct RoleRow {
    id: i64,
    label: String,
    name: String,
    description: String,
    permissions: Vec<String>,
}

#[derive(Template)]
#[template(path = "super_admin/role_edit.html")]
struct RoleEditTemplate {
    nav: Option<Nav>,
    error: Option<String>,
    id: i64,
    label: String,
    name: String,
    description: String,
    permissions: Vec<PermissionChoice>,
}

struct PermissionChoice {
    id: i64,
    name: String,
    description: String,
    checked: bool,
    pinned: bool,
}

#[derive(Template)]
#[template(path = "super_admin/permissions.html")]
struct PermissionsTemplate {
    nav: Option<Nav>,
    permissions: Vec<PermissionRow>,
}

struct PermissionRow {
    name: String,
    description: String,
    roles: String,
}

fn label_of(role: &Role) -> String {
    role.role_name()
        .map(|r| r.label().to_string())
        .unwrap_or_else(|_| role.name.clone())
}

pub async fn roles_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let roles = db::roles::list(&state.pool).await?;

    let mut rows = Vec::with_capacity(roles.len());
    for role in &roles {
        let permissions = db::role_permissions::permissions_of(&state.pool, role.id).await?;
        rows.push(RoleRow {
            id: role.id,
            label: label_of(role),
            name: role.name.clone(),
            description: role.description.clone().unwrap_or_default(),
            permissions: permissions.into_iter().map(|p| p.name).collect(),
        });
    }

    let template = RolesTemplate {
        nav: Some(Nav::for_identity(&identity)),
        roles: rows,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn edit_role_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let role = db::roles::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;

    render_role_edit(&state, &identity, &role, StatusCode::OK, None).await
}

/// Renders the edit form with the role's stored description and permissions.
pub async fn render_role_edit(
    state: &SharedState,
    identity: &AuthenticatedIdentity,
    role: &Role,
    status: StatusCode,
    error: Option<&str>,
) -> Result<Response, AppError> {
    let held: BTreeSet<i64> = db::role_permissions::permissions_of(&state.pool, role.id)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let role_name = role.role_name().ok();
    let permissions = db::permissions::list(&state.pool)
        .await?
        .into_iter()
        .map(|p| PermissionChoice {
            checked: held.contains(&p.id),
            pinned: match (role_name, p.name.parse::<PermissionName>()) {
                (Some(role), Ok(permission)) => rbac::is_pinned(role, permission),
                _ => false,
            },
            id: p.id,
            name: p.name,
            description: p.description.unwrap_or_default(),
        })
        .collect();

    let template = RoleEditTemplate {
        nav: Some(Nav::for_identity(identity)),
        error: error.map(str::to_string),
        id: role.id,
        label: label_of(role),
        name: role.name.clone(),
        description: role.description.clone().unwrap_or_default(),
        permissions,
    };
    Ok((status, Html(template.render().unwrap_or_default())).into_response())
}

pub async fn permissions_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let permissions = db::permissions::list(&state.pool).await?;

    let mut rows = Vec::with_capacity(permissions.len());
    for permission in permissions {
        let roles = db::role_permissions::roles_of(&state.pool, permission.id).await?;
        let holders = roles.iter().map(label_of).collect::<Vec<_>>();
        rows.push(PermissionRow {
            name: permission.name,
            description: permission.description.unwrap_or_default(),
            roles: if holders.is_empty() {
                "None".to_string()
            } else {
                holders.join(", ")
            },
        });
    }

    let template = PermissionsTemplate {
        nav: Some(Nav::for_identity(&identity)),
        permissions: rows,
    };
    Ok(Html(template.render().unwrap_or_default()))
}
