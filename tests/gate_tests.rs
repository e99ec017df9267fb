//! Router-level checks that never reach the store. The pool connects lazily
//! and is never used.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use finmate::auth::jwt::Claims;
use finmate::state::SharedState;

const UNUSED_DB: &str = "postgres://finmate@127.0.0.1:1/unused";

fn lazy_app() -> (Router, SharedState) {
    let pool = PgPoolOptions::new()
        .connect_lazy(UNUSED_DB)
        .expect("lazy pool");
    finmate::build_app(pool, common::test_config(UNUSED_DB)).expect("app builds")
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

fn assert_sent_to_login(resp: &axum::response::Response) {
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/auth/login");
    let cleared = resp
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("token=") && v.contains("Max-Age=0"));
    assert!(cleared, "session cookie was not cleared");
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_returns_ok_with_security_headers() {
    let (app, _) = lazy_app();
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(body_text(resp).await, "ok");
}

#[tokio::test]
async fn missing_token_redirects_to_login() {
    let (app, _) = lazy_app();
    let resp = app
        .oneshot(Request::get("/user/dashboard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_sent_to_login(&resp);
}

#[tokio::test]
async fn garbage_cookie_redirects_and_clears_it() {
    let (app, _) = lazy_app();
    let resp = app
        .oneshot(
            Request::get("/super-admin/dashboard")
                .header(header::COOKIE, "token=not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_sent_to_login(&resp);
}

#[tokio::test]
async fn garbage_bearer_header_redirects() {
    let (app, _) = lazy_app();
    let resp = app
        .oneshot(
            Request::get("/admin/users")
                .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_sent_to_login(&resp);
}

#[tokio::test]
async fn expired_token_redirects() {
    let (app, state) = lazy_app();
    let now = chrono::Utc::now().timestamp();
    let token = state
        .tokens
        .encode(&Claims {
            sub: 1,
            email: "alice@example.com".to_string(),
            role: "individual_user".to_string(),
            iat: now - 120,
            exp: now - 60,
        })
        .unwrap();

    let resp = app
        .oneshot(
            Request::get("/user/dashboard")
                .header(header::COOKIE, format!("token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_sent_to_login(&resp);
}

#[tokio::test]
async fn token_signed_with_another_secret_redirects() {
    let (app, _) = lazy_app();
    let other =
        finmate::auth::jwt::TokenService::new("some-other-secret", chrono::Duration::hours(1))
            .unwrap();
    let token = other.issue(1, "alice@example.com", "super_admin").unwrap();

    let resp = app
        .oneshot(
            Request::get("/super-admin/users")
                .header(header::COOKIE, format!("token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_sent_to_login(&resp);
}

#[tokio::test]
async fn root_without_session_goes_to_login() {
    let (app, _) = lazy_app();
    let resp = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/auth/login");
}

#[tokio::test]
async fn login_page_renders_for_anonymous_callers() {
    let (app, _) = lazy_app();
    let resp = app
        .oneshot(Request::get("/auth/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("name=\"password\""));
}

#[tokio::test]
async fn login_requires_both_fields() {
    let (app, _) = lazy_app();
    let resp = app
        .oneshot(form_post("/auth/login", "email=alice%40example.com"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.contains("Email and password are required"));
}

#[tokio::test]
async fn blocked_email_gets_429_before_any_lookup() {
    let (app, state) = lazy_app();
    for _ in 0..5 {
        state.login_limiter.record_failure("alice@example.com");
    }

    let resp = app
        .oneshot(form_post(
            "/auth/login",
            "email=Alice%40Example.com&password=secret1",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn invalid_registration_rerenders_without_store_access() {
    let (app, _) = lazy_app();
    let resp = app
        .oneshot(form_post(
            "/auth/register",
            "username=alice&email=alice%40example.com&password=abc&confirm_password=abc\
             &first_name=Alice&last_name=L",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_text(resp).await;
    assert!(body.contains("Password must be at least 6 characters long"));
    assert!(body.contains("value=\"alice\""));
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let (app, _) = lazy_app();
    let resp = app
        .oneshot(
            Request::post("/auth/logout")
                .header(header::COOKIE, "token=whatever")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_sent_to_login(&resp);
}
