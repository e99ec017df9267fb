use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::json;

use crate::auth::credentials::{self, Candidate};
use crate::auth::AuthenticatedIdentity;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Role, RoleName, UserUpdate};
use crate::routes::auth::{is_valid_email, validate_new_password};
use crate::state::SharedState;
use crate::views::admin::{can_manage, render_user_form, Section, UserFormPage, UserFormValues};
use crate::views::parse_optional_id;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UserForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role_id: String,
    pub team_id: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SetPasswordForm {
    pub new_password: String,
    pub confirm_password: String,
}

/// A submitted user form after field checks and id lookups.
struct CheckedForm {
    role: Role,
    team_id: Option<i64>,
}

impl UserForm {
    fn values(&self) -> UserFormValues {
        UserFormValues {
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role_id: self.role_id.trim().parse().ok(),
            team_id: self.team_id.trim().parse().ok(),
        }
    }

    fn check_fields(&self) -> Result<(), &'static str> {
        let required = [&self.username, &self.email, &self.first_name, &self.last_name];
        if required.iter().any(|v| v.trim().is_empty()) {
            return Err("Username, email, first name and last name are required");
        }
        if !is_valid_email(&self.email) {
            return Err("Please enter a valid email address");
        }
        Ok(())
    }
}

/// Resolves the submitted role and team. Assigning super admin is reserved to
/// super admins.
async fn check_form(
    state: &SharedState,
    identity: &AuthenticatedIdentity,
    form: &UserForm,
) -> Result<Result<CheckedForm, String>, AppError> {
    if let Err(msg) = form.check_fields() {
        return Ok(Err(msg.to_string()));
    }

    let role_id = match parse_optional_id(&form.role_id)? {
        Some(id) => id,
        None => return Ok(Err("Please choose a role".to_string())),
    };
    let Some(role) = db::roles::find_by_id(&state.pool, role_id).await? else {
        return Ok(Err("Unknown role".to_string()));
    };
    if role.name == RoleName::SuperAdmin.as_str() && !identity.is_super_admin() {
        return Err(AppError::Forbidden(
            "Only super admins can assign the super admin role".to_string(),
        ));
    }

    let team_id = parse_optional_id(&form.team_id)?;
    if let Some(team_id) = team_id
        && db::teams::find_by_id(&state.pool, team_id).await?.is_none()
    {
        return Ok(Err("Unknown team".to_string()));
    }

    Ok(Ok(CheckedForm { role, team_id }))
}

pub async fn create_user(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    uri: Uri,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    let section = Section::from_uri(&uri);
    let rerender = |error: String| {
        let state = state.clone();
        let identity = identity.clone();
        let values = form.values();
        async move {
            let page = UserFormPage {
                section,
                user_id: None,
                error: Some(&error),
                values,
            };
            render_user_form(&state, &identity, StatusCode::BAD_REQUEST, page).await
        }
    };

    let checked = match check_form(&state, &identity, &form).await? {
        Ok(checked) => checked,
        Err(msg) => return rerender(msg).await,
    };
    if let Err(msg) = validate_new_password(&form.password, &form.password) {
        return rerender(msg.to_string()).await;
    }

    let candidate = Candidate {
        username: &form.username,
        email: &form.email,
        password: &form.password,
        first_name: &form.first_name,
        last_name: &form.last_name,
        role_id: checked.role.id,
        team_id: checked.team_id,
    };

    let user_id = match credentials::create(&state.pool, &candidate).await {
        Ok(id) => id,
        Err(AppError::Validation(msg)) => return rerender(msg).await,
        Err(e) => return Err(e),
    };

    audit::log_event(
        &state.pool,
        Some(identity.id),
        "user.created",
        "user",
        Some(user_id),
        Some(json!({ "role": checked.role.name })),
    )
    .await;
    tracing::info!(user_id, created_by = identity.id, "User created");

    Ok(Redirect::to(&section.users_path()).into_response())
}

pub async fn update_user(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    uri: Uri,
    Path(id): Path<i64>,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    let section = Section::from_uri(&uri);
    let target = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if !can_manage(&identity, &target) {
        return Err(AppError::Forbidden("You cannot edit this user".to_string()));
    }

    let rerender = |error: String| {
        let state = state.clone();
        let identity = identity.clone();
        let values = form.values();
        async move {
            let page = UserFormPage {
                section,
                user_id: Some(id),
                error: Some(&error),
                values,
            };
            render_user_form(&state, &identity, StatusCode::BAD_REQUEST, page).await
        }
    };

    let checked = match check_form(&state, &identity, &form).await? {
        Ok(checked) => checked,
        Err(msg) => return rerender(msg).await,
    };

    let fields = UserUpdate {
        username: &form.username,
        email: &form.email,
        first_name: &form.first_name,
        last_name: &form.last_name,
        role_id: checked.role.id,
        team_id: checked.team_id,
    };

    let updated = match credentials::update(&state.pool, id, &fields).await {
        Ok(updated) => updated,
        Err(AppError::Validation(msg)) => return rerender(msg).await,
        Err(e) => return Err(e),
    };
    if !updated {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let mut details = json!({});
    if target.role_id != checked.role.id {
        details["role"] = json!({ "from": target.role_name, "to": checked.role.name });
    }
    audit::log_event(
        &state.pool,
        Some(identity.id),
        "user.updated",
        "user",
        Some(id),
        Some(details),
    )
    .await;

    Ok(Redirect::to(&section.users_path()).into_response())
}

pub async fn deactivate_user(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    uri: Uri,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let section = Section::from_uri(&uri);
    if id == identity.id {
        return Err(AppError::Validation(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let target = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if !can_manage(&identity, &target) {
        return Err(AppError::Forbidden(
            "You cannot deactivate this user".to_string(),
        ));
    }

    if !credentials::deactivate(&state.pool, id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(identity.id),
        "user.deactivated",
        "user",
        Some(id),
        None,
    )
    .await;
    tracing::info!(user_id = id, deactivated_by = identity.id, "User deactivated");

    Ok(Redirect::to(&section.users_path()).into_response())
}

pub async fn set_user_password(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<SetPasswordForm>,
) -> Result<Response, AppError> {
    validate_new_password(&form.new_password, &form.confirm_password)
        .map_err(|msg| AppError::Validation(msg.to_string()))?;

    if !credentials::change_secret(&state.pool, id, &form.new_password).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(identity.id),
        "user.password_changed",
        "user",
        Some(id),
        Some(json!({ "set_by_admin": true })),
    )
    .await;

    Ok(Redirect::to("/super-admin/users").into_response())
}

pub async fn restore_user(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    if !db::users::restore(&state.pool, id).await? {
        return Err(AppError::NotFound("Deactivated user not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(identity.id),
        "user.restored",
        "user",
        Some(id),
        None,
    )
    .await;

    Ok(Redirect::to("/super-admin/users/inactive").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> UserForm {
        UserForm {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Builder".to_string(),
            password: "secret1".to_string(),
            role_id: "3".to_string(),
            team_id: String::new(),
        }
    }

    #[test]
    fn complete_form_passes_field_checks() {
        assert!(form().check_fields().is_ok());
    }

    #[test]
    fn bad_email_fails_field_checks() {
        let f = UserForm {
            email: "bob".to_string(),
            ..form()
        };
        assert_eq!(f.check_fields(), Err("Please enter a valid email address"));
    }

    #[test]
    fn echoed_values_parse_select_ids() {
        let values = form().values();
        assert_eq!(values.role_id, Some(3));
        assert_eq!(values.team_id, None);
    }
}
