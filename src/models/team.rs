use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub leader_id: Option<i64>,
    pub leader_username: Option<String>,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}
