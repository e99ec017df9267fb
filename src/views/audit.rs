use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse};

use crate::auth::AuthenticatedIdentity;
use crate::db;
use crate::error::AppError;
use crate::models::AuditEvent;
use crate::state::SharedState;
use crate::views::Nav;

const RECENT_EVENTS: i64 = 200;

#[derive(Template)]
#[template(path = "super_admin/audit_logs.html")]
struct AuditLogTemplate {
    nav: Option<Nav>,
    events: Vec<EventRow>,
}

struct EventRow {
    when: String,
    who: String,
    action: String,
    resource: String,
    details: String,
}

impl From<AuditEvent> for EventRow {
    fn from(event: AuditEvent) -> Self {
        let resource = match event.resource_id {
            Some(id) => format!("{} #{id}", event.resource_type),
            None => event.resource_type,
        };
        Self {
            when: event.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            who: event.username.unwrap_or_else(|| "anonymous".to_string()),
            action: event.action,
            resource,
            details: event.details.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

pub async fn audit_logs_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let events = db::audit::list_recent(&state.pool, RECENT_EVENTS).await?;

    let template = AuditLogTemplate {
        nav: Some(Nav::for_identity(&identity)),
        events: events.into_iter().map(EventRow::from).collect(),
    };
    Ok(Html(template.render().unwrap_or_default()))
}
