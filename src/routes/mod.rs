pub mod auth;
pub mod roles;
pub mod teams;
pub mod users;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::gate::authenticate;
use crate::auth::guard::{
    authorize, authorize_permission, require_any_role, require_permission, require_role, RoleSet,
};
use crate::models::{PermissionName, RoleName};
use crate::state::SharedState;
use crate::views;

/// Wraps `routes` so every request is authenticated, then checked against `roles`.
fn guarded(
    state: &SharedState,
    roles: RoleSet,
    routes: Router<SharedState>,
) -> Router<SharedState> {
    routes
        .route_layer(from_fn_with_state(roles, authorize))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
}

pub fn app_routes(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(auth::home))
        .merge(auth_routes(state))
        .merge(super_admin_routes(state))
        .merge(admin_routes(state))
        .merge(team_leader_routes(state))
        .merge(guarded(
            state,
            require_role(RoleName::TeamMember),
            Router::new().route("/team-member/dashboard", get(views::dashboard::index)),
        ))
        .merge(guarded(
            state,
            require_role(RoleName::IndividualUser),
            Router::new().route("/user/dashboard", get(views::dashboard::index)),
        ))
}

fn auth_routes(state: &SharedState) -> Router<SharedState> {
    let public = Router::new()
        .route("/auth/login", get(views::auth::login_page).post(auth::login))
        .route(
            "/auth/register",
            get(views::auth::register_page).post(auth::register),
        )
        .route("/auth/logout", get(auth::logout).post(auth::logout));

    let signed_in = guarded(
        state,
        require_any_role(RoleName::ALL),
        Router::new()
            .route(
                "/auth/profile",
                get(views::auth::profile_page).post(auth::update_profile),
            )
            .route("/auth/change-password", post(auth::change_password)),
    );

    public.merge(signed_in)
}

fn super_admin_routes(state: &SharedState) -> Router<SharedState> {
    let roles = Router::new()
        .route("/super-admin/roles", get(views::roles::roles_page))
        .route(
            "/super-admin/roles/edit/{id}",
            get(views::roles::edit_role_page).post(roles::update_role),
        )
        .route_layer(from_fn_with_state(
            require_permission(state, PermissionName::ManageRoles),
            authorize_permission,
        ));

    let permissions = Router::new()
        .route("/super-admin/permissions", get(views::roles::permissions_page))
        .route_layer(from_fn_with_state(
            require_permission(state, PermissionName::ViewPermissions),
            authorize_permission,
        ));

    let routes = Router::new()
        .route("/super-admin/dashboard", get(views::dashboard::index))
        .route("/super-admin/users", get(views::admin::users_page))
        .route(
            "/super-admin/users/add",
            get(views::admin::add_user_page).post(users::create_user),
        )
        .route(
            "/super-admin/users/edit/{id}",
            get(views::admin::edit_user_page).post(users::update_user),
        )
        .route("/super-admin/users/delete/{id}", post(users::deactivate_user))
        .route(
            "/super-admin/users/change-password/{id}",
            post(users::set_user_password),
        )
        .route("/super-admin/users/inactive", get(views::admin::inactive_users_page))
        .route("/super-admin/users/restore/{id}", post(users::restore_user))
        .route(
            "/super-admin/teams",
            get(views::teams::teams_page),
        )
        .route("/super-admin/teams/add", post(teams::create_team))
        .route("/super-admin/audit-logs", get(views::audit::audit_logs_page))
        .merge(roles)
        .merge(permissions);

    guarded(state, require_role(RoleName::SuperAdmin), routes)
}

fn admin_routes(state: &SharedState) -> Router<SharedState> {
    let routes = Router::new()
        .route("/admin/dashboard", get(views::dashboard::index))
        .route("/admin/users", get(views::admin::users_page))
        .route(
            "/admin/users/add",
            get(views::admin::add_user_page).post(users::create_user),
        )
        .route(
            "/admin/users/edit/{id}",
            get(views::admin::edit_user_page).post(users::update_user),
        )
        .route("/admin/users/delete/{id}", post(users::deactivate_user));

    guarded(
        state,
        require_any_role([RoleName::Admin, RoleName::SuperAdmin]),
        routes,
    )
}

fn team_leader_routes(state: &SharedState) -> Router<SharedState> {
    let dashboard = guarded(
        state,
        require_role(RoleName::TeamLeader),
        Router::new().route("/team-leader/dashboard", get(views::dashboard::index)),
    );

    let team = guarded(
        state,
        require_any_role([RoleName::TeamLeader, RoleName::Admin, RoleName::SuperAdmin]),
        Router::new()
            .route("/team-leader/team", get(views::teams::my_team_page))
            .route("/team-leader/team/add-member", post(teams::add_member))
            .route(
                "/team-leader/team/remove-member/{id}",
                post(teams::remove_member),
            ),
    );

    dashboard.merge(team)
}
