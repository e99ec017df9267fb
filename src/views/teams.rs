use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::auth::AuthenticatedIdentity;
use crate::db;
use crate::error::AppError;
use crate::models::RoleName;
use crate::state::SharedState;
use crate::views::{Nav, SelectOption};

#[derive(Template)]
#[template(path = "super_admin/teams.html")]
struct TeamsTemplate {
    nav: Option<Nav>,
    error: Option<String>,
    teams: Vec<TeamRow>,
    leaders: Vec<SelectOption>,
}

struct TeamRow {
    name: String,
    description: String,
    leader: String,
    member_count: i64,
}

#[derive(Template)]
#[template(path = "team_leader/team.html")]
struct MyTeamTemplate {
    nav: Option<Nav>,
    team: Option<TeamHeader>,
    members: Vec<MemberRow>,
    candidates: Vec<SelectOption>,
}

struct TeamHeader {
    name: String,
    description: String,
}

struct MemberRow {
    id: i64,
    full_name: String,
    email: String,
    role_label: String,
    removable: bool,
}

pub async fn teams_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
) -> Result<Response, AppError> {
    render_teams(&state, &identity, StatusCode::OK, None).await
}

pub async fn render_teams(
    state: &SharedState,
    identity: &AuthenticatedIdentity,
    status: StatusCode,
    error: Option<&str>,
) -> Result<Response, AppError> {
    let teams = db::teams::list(&state.pool).await?;
    let leaders = db::users::list_active(&state.pool)
        .await?
        .into_iter()
        .filter(|u| u.role_name == RoleName::TeamLeader.as_str())
        .map(|u| SelectOption {
            label: format!("{} ({})", u.full_name(), u.username),
            value: u.id.to_string(),
            selected: false,
        })
        .collect();

    let template = TeamsTemplate {
        nav: Some(Nav::for_identity(identity)),
        error: error.map(str::to_string),
        teams: teams
            .into_iter()
            .map(|t| TeamRow {
                name: t.name,
                description: t.description.unwrap_or_default(),
                leader: t.leader_username.unwrap_or_else(|| "None".to_string()),
                member_count: t.member_count,
            })
            .collect(),
        leaders,
    };
    Ok((status, Html(template.render().unwrap_or_default())).into_response())
}

pub async fn my_team_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let nav = Some(Nav::for_identity(&identity));

    let Some(team) = db::teams::find_led_by(&state.pool, identity.id).await? else {
        let template = MyTeamTemplate {
            nav,
            team: None,
            members: Vec::new(),
            candidates: Vec::new(),
        };
        return Ok(Html(template.render().unwrap_or_default()));
    };

    let members = db::users::list_by_team(&state.pool, team.id)
        .await?
        .into_iter()
        .map(|u| MemberRow {
            id: u.id,
            full_name: u.full_name(),
            email: u.email.clone(),
            role_label: u
                .role_name
                .parse::<RoleName>()
                .map(|r| r.label().to_string())
                .unwrap_or(u.role_name.clone()),
            removable: u.id != identity.id,
        })
        .collect();

    let candidates = db::users::list_team_candidates(&state.pool)
        .await?
        .into_iter()
        .map(|u| SelectOption {
            label: format!("{} <{}>", u.full_name(), u.email),
            value: u.id.to_string(),
            selected: false,
        })
        .collect();

    let template = MyTeamTemplate {
        nav,
        team: Some(TeamHeader {
            name: team.name,
            description: team.description.unwrap_or_default(),
        }),
        members,
        candidates,
    };
    Ok(Html(template.render().unwrap_or_default()))
}
