use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::auth::jwt::TokenError;
use crate::auth::session::clear_session_cookie;
use crate::views::Nav;

#[derive(Debug)]
pub enum AppError {
    /// Bad or missing input.
    Validation(String),
    /// Missing, invalid or expired token, or a deactivated identity.
    Authentication(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// The system is missing something it cannot run without.
    Configuration(String),
    NotFound(String),
    Conflict(String),
    RateLimited(String),
    Internal(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation Error: {msg}"),
            AppError::Authentication(msg) => write!(f, "Unauthenticated: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::Configuration(msg) => write!(f, "Configuration Error: {msg}"),
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl std::error::Error for AppError {}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    nav: Option<Nav>,
    title: String,
    message: String,
}

pub fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    let template = ErrorTemplate {
        nav: None,
        title: title.to_string(),
        message: message.to_string(),
    };
    (status, Html(template.render().unwrap_or_default())).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Authentication(msg) => {
                tracing::debug!("Authentication failed: {msg}");
                (clear_session_cookie(), Redirect::to("/auth/login")).into_response()
            }
            AppError::Forbidden(msg) => error_page(StatusCode::FORBIDDEN, "Access Denied", &msg),
            AppError::Validation(msg) => {
                error_page(StatusCode::BAD_REQUEST, "Invalid Request", &msg)
            }
            AppError::NotFound(msg) => error_page(StatusCode::NOT_FOUND, "Not Found", &msg),
            AppError::Conflict(msg) => error_page(StatusCode::CONFLICT, "Conflict", &msg),
            AppError::RateLimited(msg) => {
                error_page(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests", &msg)
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server Error",
                    "System configuration error",
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server Error",
                    "Internal server error",
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server Error",
                    "Internal server error",
                )
            }
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Configuration(msg) => AppError::Configuration(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}
