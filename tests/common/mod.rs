#![allow(dead_code)]

use reqwest::{Client, Response};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use finmate::config::Config;
use finmate::state::SharedState;

pub const PASSWORD: &str = "secret1";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: std::net::SocketAddr,
    pub pool: PgPool,
    pub state: SharedState,
    pub client: Client,
    pub db_name: String,
}

pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        session_ttl: chrono::Duration::hours(48),
        secure_cookies: false,
        db_max_connections: 5,
        log_level: "warn".to_string(),
        bootstrap_admin: None,
    }
}

/// Value of the `token` cookie set by a response, if any.
pub fn session_token(resp: &Response) -> Option<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("token="))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}

pub fn location(resp: &Response) -> Option<String> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/register"))
            .form(&[
                ("username", username),
                ("email", email),
                ("password", password),
                ("confirm_password", password),
                ("first_name", "Test"),
                ("last_name", "User"),
            ])
            .send()
            .await
            .expect("register request failed")
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/login"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .expect("login request failed")
    }

    /// Registers and logs in a user, returning the session token.
    pub async fn signed_in(&self, username: &str, email: &str) -> String {
        let resp = self.register(username, email, PASSWORD).await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK, "register failed");
        let resp = self.login(email, PASSWORD).await;
        session_token(&resp).expect("login did not set a session cookie")
    }

    /// Moves a user to another role directly in the store.
    pub async fn set_role(&self, email: &str, role: &str) {
        sqlx::query(
            "UPDATE users SET role_id = (SELECT id FROM roles WHERE name = $2) WHERE email = $1",
        )
        .bind(email)
        .bind(role)
        .execute(&self.pool)
        .await
        .expect("set role failed");
    }

    pub async fn user_id(&self, email: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .expect("user lookup failed")
    }

    pub async fn permission_id(&self, name: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM permissions WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .expect("permission lookup failed")
    }

    pub async fn get(&self, path: &str, token: &str) -> Response {
        self.client
            .get(self.url(path))
            .header(reqwest::header::COOKIE, format!("token={token}"))
            .send()
            .await
            .expect("get request failed")
    }

    pub async fn post_form(&self, path: &str, token: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header(reqwest::header::COOKIE, format!("token={token}"))
            .form(form)
            .send()
            .await
            .expect("post request failed")
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database. Returns `None` when no
/// `DATABASE_URL` is configured.
pub async fn spawn_app() -> Option<TestApp> {
    let _ = dotenvy::dotenv();

    let Ok(base_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let db_name = format!("finmate_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let (app, state) =
        finmate::build_app(pool.clone(), test_config(&test_url)).expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    Some(TestApp {
        addr,
        pool,
        state,
        client,
        db_name,
    })
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let Ok(base_url) = std::env::var("DATABASE_URL") else {
        return;
    };

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
