use askama::Template;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::auth::gate::resolve_identity;
use crate::auth::AuthenticatedIdentity;
use crate::db;
use crate::error::AppError;
use crate::routes::auth::{RegisterForm, MIN_PASSWORD_LEN};
use crate::state::SharedState;
use crate::views::Nav;

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    nav: Option<Nav>,
    error: Option<String>,
    email: String,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    nav: Option<Nav>,
    error: Option<String>,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    min_password_len: usize,
}

#[derive(Template)]
#[template(path = "auth/register_success.html")]
struct RegisterSuccessTemplate {
    nav: Option<Nav>,
}

#[derive(Template)]
#[template(path = "auth/profile.html")]
struct ProfileTemplate {
    nav: Option<Nav>,
    error: Option<String>,
    success: Option<String>,
    email: String,
    role_label: String,
    team_name: String,
    username: String,
    first_name: String,
    last_name: String,
}

#[derive(Deserialize)]
pub struct ProfileQuery {
    pub updated: Option<String>,
}

pub fn render_login(status: StatusCode, error: Option<&str>, email: &str) -> Response {
    let template = LoginTemplate {
        nav: None,
        error: error.map(str::to_string),
        email: email.to_string(),
    };
    (status, Html(template.render().unwrap_or_default())).into_response()
}

pub fn render_register(status: StatusCode, error: Option<&str>, form: &RegisterForm) -> Response {
    let template = RegisterTemplate {
        nav: None,
        error: error.map(str::to_string),
        username: form.username.clone(),
        email: form.email.clone(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        min_password_len: MIN_PASSWORD_LEN,
    };
    (status, Html(template.render().unwrap_or_default())).into_response()
}

pub fn render_register_success() -> Response {
    let template = RegisterSuccessTemplate { nav: None };
    Html(template.render().unwrap_or_default()).into_response()
}

pub async fn login_page(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    // Already signed in: go straight to the landing page
    if let Ok(identity) = resolve_identity(&state, &headers).await {
        return Redirect::to(identity.role.landing_path()).into_response();
    }

    render_login(StatusCode::OK, None, "")
}

pub async fn register_page() -> Response {
    render_register(StatusCode::OK, None, &RegisterForm::default())
}

pub async fn profile_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    Query(q): Query<ProfileQuery>,
) -> Result<Response, AppError> {
    let success = match q.updated.as_deref() {
        Some("profile") => Some("Profile updated successfully"),
        Some("password") => Some("Password changed successfully"),
        _ => None,
    };
    render_profile(&state, &identity, None, success).await
}

pub async fn render_profile(
    state: &SharedState,
    identity: &AuthenticatedIdentity,
    error: Option<&str>,
    success: Option<&str>,
) -> Result<Response, AppError> {
    let user = db::users::find_by_id(&state.pool, identity.id)
        .await?
        .ok_or_else(|| AppError::Authentication("User not found or inactive".to_string()))?;

    let template = ProfileTemplate {
        nav: Some(Nav::for_identity(identity)),
        error: error.map(str::to_string),
        success: success.map(str::to_string),
        email: user.email,
        role_label: identity.role.label().to_string(),
        team_name: user.team_name.unwrap_or_else(|| "None".to_string()),
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
    };
    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    Ok((status, Html(template.render().unwrap_or_default())).into_response())
}
