use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user row joined with its role name and, when assigned, its team name.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: i64,
    pub role_name: String,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields accepted when creating a credential.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role_id: i64,
    pub team_id: Option<i64>,
}

/// Mutable profile, role and team fields. The password is changed separately.
#[derive(Debug, Clone)]
pub struct UserUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role_id: i64,
    pub team_id: Option<i64>,
}
