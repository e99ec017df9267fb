use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthenticatedIdentity;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{RoleName, Team};
use crate::state::SharedState;
use crate::views::parse_optional_id;
use crate::views::teams::render_teams;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct TeamForm {
    pub name: String,
    pub description: String,
    pub leader_id: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct MemberForm {
    pub user_id: String,
}

pub async fn create_team(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    Form(form): Form<TeamForm>,
) -> Result<Response, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return render_teams(
            &state,
            &identity,
            StatusCode::BAD_REQUEST,
            Some("Team name is required"),
        )
        .await;
    }

    let leader_id = parse_optional_id(&form.leader_id)?;
    if let Some(leader_id) = leader_id {
        let leader = db::users::find_by_id(&state.pool, leader_id).await?;
        if !leader.is_some_and(|u| u.role_name == RoleName::TeamLeader.as_str()) {
            return render_teams(
                &state,
                &identity,
                StatusCode::BAD_REQUEST,
                Some("The leader must be an active team leader"),
            )
            .await;
        }
        if db::teams::find_led_by(&state.pool, leader_id).await?.is_some() {
            return render_teams(
                &state,
                &identity,
                StatusCode::CONFLICT,
                Some("That team leader already leads a team"),
            )
            .await;
        }
    }

    let description = form.description.trim();
    let description = (!description.is_empty()).then_some(description);

    let mut tx = state.pool.begin().await?;
    let team_id = match db::teams::create(&mut *tx, name, description, leader_id).await {
        Ok(id) => id,
        Err(e) if db::is_unique_violation(&e) => {
            drop(tx);
            return render_teams(
                &state,
                &identity,
                StatusCode::CONFLICT,
                Some("A team with that name already exists"),
            )
            .await;
        }
        Err(e) => return Err(e.into()),
    };
    if let Some(leader_id) = leader_id {
        // A leader already in another team keeps that membership
        db::users::join_team(&mut *tx, leader_id, team_id).await?;
    }
    tx.commit().await?;

    audit::log_event(
        &state.pool,
        Some(identity.id),
        "team.created",
        "team",
        Some(team_id),
        Some(json!({ "name": name, "leader_id": leader_id })),
    )
    .await;
    tracing::info!(team_id, "Team created");

    Ok(Redirect::to("/super-admin/teams").into_response())
}

async fn led_team(state: &SharedState, identity: &AuthenticatedIdentity) -> Result<Team, AppError> {
    db::teams::find_led_by(&state.pool, identity.id)
        .await?
        .ok_or_else(|| AppError::Forbidden("You are not leading a team".to_string()))
}

pub async fn add_member(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    Form(form): Form<MemberForm>,
) -> Result<Response, AppError> {
    let team = led_team(&state, &identity).await?;
    let user_id = parse_optional_id(&form.user_id)?
        .ok_or_else(|| AppError::Validation("Please choose a user".to_string()))?;

    if !db::users::recruit(&state.pool, user_id, team.id).await? {
        return Err(AppError::Conflict(
            "That user is inactive, already in a team or not a member-level account".to_string(),
        ));
    }

    audit::log_event(
        &state.pool,
        Some(identity.id),
        "team.member_added",
        "team",
        Some(team.id),
        Some(json!({ "user_id": user_id })),
    )
    .await;

    Ok(Redirect::to("/team-leader/team").into_response())
}

pub async fn remove_member(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    let team = led_team(&state, &identity).await?;
    if user_id == identity.id {
        return Err(AppError::Validation(
            "You cannot remove yourself from your own team".to_string(),
        ));
    }

    if !db::users::leave_team(&state.pool, user_id, team.id).await? {
        return Err(AppError::NotFound("That user is not in your team".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(identity.id),
        "team.member_removed",
        "team",
        Some(team.id),
        Some(json!({ "user_id": user_id })),
    )
    .await;

    Ok(Redirect::to("/team-leader/team").into_response())
}
