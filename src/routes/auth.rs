use std::sync::LazyLock;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::auth::credentials::{self, Candidate};
use crate::auth::gate::resolve_identity;
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::auth::{password, AuthenticatedIdentity};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::RoleName;
use crate::state::SharedState;
use crate::views::auth::{render_login, render_profile, render_register, render_register_success};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Shown for unknown emails and wrong passwords alike.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default, Clone)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        let required = [
            &self.username,
            &self.email,
            &self.password,
            &self.confirm_password,
            &self.first_name,
            &self.last_name,
        ];
        if required.iter().any(|v| v.trim().is_empty()) {
            return Err("All fields are required");
        }
        if !is_valid_email(&self.email) {
            return Err("Please enter a valid email address");
        }
        validate_new_password(&self.password, &self.confirm_password)
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 6 characters long");
    }
    if password != confirmation {
        return Err("Passwords do not match");
    }
    Ok(())
}

pub async fn home(State(state): State<SharedState>, headers: HeaderMap) -> Redirect {
    match resolve_identity(&state, &headers).await {
        Ok(identity) => Redirect::to(identity.role.landing_path()),
        Err(_) => Redirect::to("/auth/login"),
    }
}

pub async fn login(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Ok(render_login(
            StatusCode::BAD_REQUEST,
            Some("Email and password are required"),
            email,
        ));
    }

    if state.login_limiter.check(email).is_err() {
        tracing::warn!("Login rate limit hit for {email}");
        return Ok(render_login(
            StatusCode::TOO_MANY_REQUESTS,
            Some("Too many login attempts. Please try again later."),
            email,
        ));
    }

    let Some(user) = credentials::authenticate(&state.pool, email, &form.password).await? else {
        state.login_limiter.record_failure(email);
        audit::log_event(
            &state.pool,
            None,
            "user.login_failed",
            "user",
            None,
            Some(json!({ "email": credentials::normalize_email(email) })),
        )
        .await;
        return Ok(render_login(
            StatusCode::UNAUTHORIZED,
            Some(INVALID_CREDENTIALS),
            email,
        ));
    };

    let identity = AuthenticatedIdentity::from_user(&user)?;
    let token = state
        .tokens
        .issue(identity.id, &identity.email, identity.role.as_str())?;

    audit::log_event(&state.pool, Some(user.id), "user.login", "user", Some(user.id), None).await;
    tracing::info!(user_id = user.id, role = %identity.role, "User logged in");

    let jar = CookieJar::new().add(session_cookie(
        &token,
        state.tokens.ttl(),
        state.config.secure_cookies,
    ));
    Ok((jar, Redirect::to(identity.role.landing_path())).into_response())
}

pub async fn register(
    State(state): State<SharedState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if let Err(msg) = form.validate() {
        return Ok(render_register(StatusCode::BAD_REQUEST, Some(msg), &form));
    }

    let email = credentials::normalize_email(&form.email);
    if db::users::identity_taken(&state.pool, &email, form.username.trim(), None).await? {
        return Ok(render_register(
            StatusCode::CONFLICT,
            Some(credentials::DUPLICATE_IDENTITY),
            &form,
        ));
    }

    let role = db::roles::find_by_name(&state.pool, RoleName::DEFAULT.as_str())
        .await?
        .ok_or_else(|| {
            AppError::Configuration(format!(
                "Default role '{}' is missing from the role catalog",
                RoleName::DEFAULT
            ))
        })?;

    let candidate = Candidate {
        username: &form.username,
        email: &form.email,
        password: &form.password,
        first_name: &form.first_name,
        last_name: &form.last_name,
        role_id: role.id,
        team_id: None,
    };

    let user_id = match credentials::create(&state.pool, &candidate).await {
        Ok(id) => id,
        Err(AppError::Validation(msg)) => {
            return Ok(render_register(StatusCode::CONFLICT, Some(&msg), &form));
        }
        Err(e) => return Err(e),
    };

    audit::log_event(
        &state.pool,
        Some(user_id),
        "user.registered",
        "user",
        Some(user_id),
        None,
    )
    .await;
    tracing::info!(user_id, "User registered");

    Ok(render_register_success())
}

pub async fn logout() -> impl IntoResponse {
    (clear_session_cookie(), Redirect::to("/auth/login"))
}

pub async fn update_profile(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    if username.is_empty()
        || form.first_name.trim().is_empty()
        || form.last_name.trim().is_empty()
    {
        return render_profile(&state, &identity, Some("All fields are required"), None).await;
    }

    if db::users::identity_taken(&state.pool, &identity.email, username, Some(identity.id)).await? {
        let error = Some("That username is already taken");
        return render_profile(&state, &identity, error, None).await;
    }

    let updated = db::users::update_profile(
        &state.pool,
        identity.id,
        username,
        form.first_name.trim(),
        form.last_name.trim(),
    )
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e) {
            AppError::Conflict("That username is already taken".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    if !updated {
        return Err(AppError::Authentication("User not found or inactive".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(identity.id),
        "user.updated",
        "user",
        Some(identity.id),
        None,
    )
    .await;

    Ok(Redirect::to("/auth/profile?updated=profile").into_response())
}

pub async fn change_password(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response, AppError> {
    let user = credentials::find_by_id(&state.pool, identity.id)
        .await?
        .ok_or_else(|| AppError::Authentication("User not found or inactive".to_string()))?;

    let valid = password::verify(&form.current_password, &user.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        return render_profile(&state, &identity, Some("Current password is incorrect"), None).await;
    }

    if let Err(msg) = validate_new_password(&form.new_password, &form.confirm_password) {
        return render_profile(&state, &identity, Some(msg), None).await;
    }

    credentials::change_secret(&state.pool, identity.id, &form.new_password).await?;

    audit::log_event(
        &state.pool,
        Some(identity.id),
        "user.password_changed",
        "user",
        Some(identity.id),
        None,
    )
    .await;

    Ok(Redirect::to("/auth/profile?updated=password").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> RegisterForm {
        RegisterForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
        }
    }

    #[test]
    fn complete_registration_passes() {
        assert_eq!(alice().validate(), Ok(()));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let form = RegisterForm {
            last_name: "  ".to_string(),
            ..alice()
        };
        assert_eq!(form.validate(), Err("All fields are required"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in ["alice", "alice@example", "al ice@example.com", "@example.com"] {
            let form = RegisterForm {
                email: email.to_string(),
                ..alice()
            };
            assert_eq!(form.validate(), Err("Please enter a valid email address"), "{email}");
        }
    }

    #[test]
    fn short_password_is_rejected() {
        let form = RegisterForm {
            password: "abc".to_string(),
            confirm_password: "abc".to_string(),
            ..alice()
        };
        assert_eq!(form.validate(), Err("Password must be at least 6 characters long"));
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let form = RegisterForm {
            confirm_password: "secret2".to_string(),
            ..alice()
        };
        assert_eq!(form.validate(), Err("Passwords do not match"));
    }
}
