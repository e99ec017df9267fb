use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::identity::AuthenticatedIdentity;
use crate::auth::jwt::TokenError;
use crate::auth::session;
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

/// Resolves the request's token to a live identity.
///
/// Token present -> claims valid -> active user found -> identity. Any failed
/// step is an authentication error, which responds with a redirect to the
/// login page and a cleared session cookie.
pub async fn resolve_identity(
    state: &SharedState,
    headers: &HeaderMap,
) -> Result<AuthenticatedIdentity, AppError> {
    let token = session::extract_token(headers)
        .ok_or_else(|| AppError::Authentication("Missing authentication token".to_string()))?;

    let claims = state.tokens.verify(&token).map_err(|e| match e {
        TokenError::Expired => AppError::Authentication("Session expired".to_string()),
        TokenError::Invalid(reason) => {
            tracing::debug!("Rejected token: {reason}");
            AppError::Authentication("Invalid session token".to_string())
        }
        TokenError::Configuration(msg) => AppError::Configuration(msg),
    })?;

    let user = db::users::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::info!(user_id = claims.sub, "Token refers to a missing or inactive user");
            AppError::Authentication("User not found or inactive".to_string())
        })?;

    AuthenticatedIdentity::from_user(&user)
}

/// Middleware attaching the resolved [`AuthenticatedIdentity`] to the request.
pub async fn authenticate(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = resolve_identity(&state, req.headers()).await?;
    tracing::debug!(
        user_id = identity.id,
        role = %identity.role,
        path = %req.uri().path(),
        "Authenticated request"
    );
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
