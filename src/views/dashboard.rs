use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse};

use crate::auth::AuthenticatedIdentity;
use crate::db;
use crate::error::AppError;
use crate::models::RoleName;
use crate::state::SharedState;
use crate::views::Nav;

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    nav: Option<Nav>,
    heading: String,
    full_name: String,
    role_label: String,
    team_name: String,
    stats: Vec<Stat>,
    permissions: Vec<String>,
}

struct Stat {
    label: &'static str,
    value: i64,
}

/// Landing page shared by every role section; content varies with the caller's role.
pub async fn index(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let stats = match identity.role {
        RoleName::SuperAdmin => vec![
            Stat {
                label: "Active users",
                value: db::users::count_by_status(&state.pool, true).await?,
            },
            Stat {
                label: "Deactivated users",
                value: db::users::count_by_status(&state.pool, false).await?,
            },
            Stat {
                label: "Teams",
                value: db::teams::count(&state.pool).await?,
            },
            Stat {
                label: "Roles",
                value: db::roles::count(&state.pool).await?,
            },
        ],
        RoleName::Admin => vec![
            Stat {
                label: "Active users",
                value: db::users::count_by_status(&state.pool, true).await?,
            },
            Stat {
                label: "Teams",
                value: db::teams::count(&state.pool).await?,
            },
        ],
        RoleName::TeamLeader => match db::teams::find_led_by(&state.pool, identity.id).await? {
            Some(team) => vec![Stat {
                label: "Team members",
                value: team.member_count,
            }],
            None => Vec::new(),
        },
        RoleName::TeamMember | RoleName::IndividualUser => Vec::new(),
    };

    let team_name = match identity.team_id {
        Some(team_id) => db::teams::find_by_id(&state.pool, team_id)
            .await?
            .map(|t| t.name),
        None => None,
    };

    let permissions =
        db::role_permissions::permission_names_of_role(&state.pool, identity.role.as_str()).await?;

    let template = DashboardTemplate {
        nav: Some(Nav::for_identity(&identity)),
        heading: format!("{} Dashboard", identity.role.label()),
        full_name: identity.full_name.clone(),
        role_label: identity.role.label().to_string(),
        team_name: team_name.unwrap_or_else(|| "None".to_string()),
        stats,
        permissions,
    };
    Ok(Html(template.render().unwrap_or_default()))
}
