use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::jwt::TokenService;
use crate::config::Config;
use crate::rate_limit::LoginRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub tokens: TokenService,
    pub login_limiter: LoginRateLimiter,
}
