use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::Form;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthenticatedIdentity;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::rbac;
use crate::state::SharedState;
use crate::views::roles::render_role_edit;

/// Role edit form. Each checked box repeats the `permissions` key.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RoleForm {
    pub description: String,
    pub permissions: Vec<i64>,
}

/// Keeps only ids present in the permission catalog, deduplicated.
pub fn known_ids(submitted: &[i64], catalog: &BTreeSet<i64>) -> Vec<i64> {
    submitted
        .iter()
        .copied()
        .filter(|id| catalog.contains(id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub async fn update_role(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<RoleForm>,
) -> Result<Response, AppError> {
    let role = db::roles::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;

    let permissions = db::permissions::list(&state.pool).await?;
    let catalog: BTreeSet<i64> = permissions.iter().map(|p| p.id).collect();
    let desired = known_ids(&form.permissions, &catalog);

    if let Ok(role_name) = role.role_name() {
        let desired_names = permissions
            .iter()
            .filter(|p| desired.contains(&p.id))
            .map(|p| p.name.as_str());
        let missing = rbac::missing_pinned(role_name, desired_names);
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|p| p.as_str()).collect();
            let message = format!("The {} role must keep: {}", role_name.label(), names.join(", "));
            return render_role_edit(
                &state,
                &identity,
                &role,
                StatusCode::BAD_REQUEST,
                Some(&message),
            )
            .await;
        }
    }

    let description = form.description.trim();
    let description = (!description.is_empty()).then_some(description);
    db::roles::update_description(&state.pool, role.id, description).await?;

    let plan = rbac::set_role_permissions(&state.pool, role.id, &desired).await?;

    if !plan.is_empty() {
        audit::log_event(
            &state.pool,
            Some(identity.id),
            "role.permissions_updated",
            "role",
            Some(role.id),
            Some(json!({
                "role": role.name,
                "granted": plan.grants,
                "revoked": plan.revokes,
            })),
        )
        .await;
    }

    Ok(Redirect::to("/super-admin/roles").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_repeated_ids_are_dropped() {
        let catalog: BTreeSet<i64> = [1, 2, 3].into_iter().collect();
        assert_eq!(known_ids(&[3, 99, 1, 3], &catalog), vec![1, 3]);
        assert!(known_ids(&[], &catalog).is_empty());
    }
}
