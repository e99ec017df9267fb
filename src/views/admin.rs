use askama::Template;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};

use crate::auth::AuthenticatedIdentity;
use crate::db;
use crate::error::AppError;
use crate::models::{RoleName, User};
use crate::state::SharedState;
use crate::views::{Nav, SelectOption};

/// Which administrative area a user-management request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    SuperAdmin,
    Admin,
}

impl Section {
    pub fn from_uri(uri: &Uri) -> Self {
        if uri.path().starts_with("/super-admin/") {
            Section::SuperAdmin
        } else {
            Section::Admin
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Section::SuperAdmin => "/super-admin",
            Section::Admin => "/admin",
        }
    }

    pub fn users_path(self) -> String {
        format!("{}/users", self.prefix())
    }
}

#[derive(Template)]
#[template(path = "admin/users.html")]
struct UsersTemplate {
    nav: Option<Nav>,
    section: &'static str,
    show_inactive_link: bool,
    users: Vec<UserRow>,
}

struct UserRow {
    id: i64,
    username: String,
    full_name: String,
    email: String,
    role_label: String,
    team_name: String,
    joined: String,
    can_manage: bool,
}

#[derive(Template)]
#[template(path = "admin/inactive_users.html")]
struct InactiveUsersTemplate {
    nav: Option<Nav>,
    users: Vec<InactiveRow>,
}

struct InactiveRow {
    id: i64,
    username: String,
    full_name: String,
    email: String,
    role_label: String,
}

#[derive(Template)]
#[template(path = "admin/user_form.html")]
struct UserFormTemplate {
    nav: Option<Nav>,
    heading: String,
    error: Option<String>,
    action: String,
    section: &'static str,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    with_password: bool,
    roles: Vec<SelectOption>,
    teams: Vec<SelectOption>,
    password_action: Option<String>,
}

/// Values echoed back into the add/edit form.
#[derive(Debug, Clone, Default)]
pub struct UserFormValues {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: Option<i64>,
    pub team_id: Option<i64>,
}

impl From<&User> for UserFormValues {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role_id: Some(user.role_id),
            team_id: user.team_id,
        }
    }
}

/// Target of an add/edit form render. `user_id` is `None` when adding.
pub struct UserFormPage<'a> {
    pub section: Section,
    pub user_id: Option<i64>,
    pub error: Option<&'a str>,
    pub values: UserFormValues,
}

fn role_label(name: &str) -> String {
    name.parse::<RoleName>()
        .map(|r| r.label().to_string())
        .unwrap_or_else(|_| name.to_string())
}

/// Whether `actor` may edit or deactivate `target`. Nobody manages themself
/// here, and only super admins manage super admins.
pub fn can_manage(actor: &AuthenticatedIdentity, target: &User) -> bool {
    if actor.id == target.id {
        return false;
    }
    actor.is_super_admin() || target.role_name != RoleName::SuperAdmin.as_str()
}

pub async fn users_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    uri: Uri,
) -> Result<impl IntoResponse, AppError> {
    let section = Section::from_uri(&uri);
    let users = db::users::list_active(&state.pool).await?;

    let rows = users
        .iter()
        .map(|u| UserRow {
            id: u.id,
            username: u.username.clone(),
            full_name: u.full_name(),
            email: u.email.clone(),
            role_label: role_label(&u.role_name),
            team_name: u.team_name.clone().unwrap_or_default(),
            joined: u.created_at.format("%Y-%m-%d").to_string(),
            can_manage: can_manage(&identity, u),
        })
        .collect();

    let template = UsersTemplate {
        nav: Some(Nav::for_identity(&identity)),
        section: section.prefix(),
        show_inactive_link: section == Section::SuperAdmin,
        users: rows,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn inactive_users_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let users = db::users::list_inactive(&state.pool).await?;

    let template = InactiveUsersTemplate {
        nav: Some(Nav::for_identity(&identity)),
        users: users
            .iter()
            .map(|u| InactiveRow {
                id: u.id,
                username: u.username.clone(),
                full_name: u.full_name(),
                email: u.email.clone(),
                role_label: role_label(&u.role_name),
            })
            .collect(),
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn add_user_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    uri: Uri,
) -> Result<Response, AppError> {
    let page = UserFormPage {
        section: Section::from_uri(&uri),
        user_id: None,
        error: None,
        values: UserFormValues::default(),
    };
    render_user_form(&state, &identity, StatusCode::OK, page).await
}

pub async fn edit_user_page(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
    uri: Uri,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !can_manage(&identity, &user) {
        return Err(AppError::Forbidden("You cannot edit this user".to_string()));
    }

    let page = UserFormPage {
        section: Section::from_uri(&uri),
        user_id: Some(user.id),
        error: None,
        values: UserFormValues::from(&user),
    };
    render_user_form(&state, &identity, StatusCode::OK, page).await
}

pub async fn render_user_form(
    state: &SharedState,
    identity: &AuthenticatedIdentity,
    status: StatusCode,
    page: UserFormPage<'_>,
) -> Result<Response, AppError> {
    let roles = db::roles::list(&state.pool).await?;
    let teams = db::teams::list(&state.pool).await?;

    let selected_role = page.values.role_id.or_else(|| {
        roles
            .iter()
            .find(|r| r.name == RoleName::DEFAULT.as_str())
            .map(|r| r.id)
    });

    let role_options = roles
        .iter()
        .filter(|r| identity.is_super_admin() || r.name != RoleName::SuperAdmin.as_str())
        .map(|r| SelectOption {
            value: r.id.to_string(),
            label: role_label(&r.name),
            selected: Some(r.id) == selected_role,
        })
        .collect();

    let team_options = teams
        .iter()
        .map(|t| SelectOption {
            value: t.id.to_string(),
            label: t.name.clone(),
            selected: Some(t.id) == page.values.team_id,
        })
        .collect();

    let section = page.section;
    let (heading, action, password_action) = match page.user_id {
        Some(id) => (
            "Edit user",
            format!("{}/users/edit/{id}", section.prefix()),
            (section == Section::SuperAdmin)
                .then(|| format!("/super-admin/users/change-password/{id}")),
        ),
        None => ("Add user", format!("{}/users/add", section.prefix()), None),
    };

    let values = page.values;
    let template = UserFormTemplate {
        nav: Some(Nav::for_identity(identity)),
        heading: heading.to_string(),
        error: page.error.map(str::to_string),
        action,
        section: section.prefix(),
        username: values.username,
        email: values.email,
        first_name: values.first_name,
        last_name: values.last_name,
        with_password: page.user_id.is_none(),
        roles: role_options,
        teams: team_options,
        password_action,
    };
    Ok((status, Html(template.render().unwrap_or_default())).into_response())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user(id: i64, role: RoleName) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            role_id: 1,
            role_name: role.as_str().to_string(),
            team_id: None,
            team_name: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn actor(id: i64, role: RoleName) -> AuthenticatedIdentity {
        AuthenticatedIdentity::from_user(&user(id, role)).unwrap()
    }

    #[test]
    fn section_follows_path_prefix() {
        let uri: Uri = "/super-admin/users/add".parse().unwrap();
        assert_eq!(Section::from_uri(&uri), Section::SuperAdmin);
        let uri: Uri = "/admin/users/add".parse().unwrap();
        assert_eq!(Section::from_uri(&uri), Section::Admin);
        assert_eq!(Section::Admin.users_path(), "/admin/users");
    }

    #[test]
    fn admins_cannot_manage_super_admins() {
        let admin = actor(1, RoleName::Admin);
        assert!(!can_manage(&admin, &user(2, RoleName::SuperAdmin)));
        assert!(can_manage(&admin, &user(3, RoleName::TeamMember)));

        let root = actor(4, RoleName::SuperAdmin);
        assert!(can_manage(&root, &user(2, RoleName::SuperAdmin)));
    }

    #[test]
    fn nobody_manages_themself() {
        let root = actor(4, RoleName::SuperAdmin);
        assert!(!can_manage(&root, &user(4, RoleName::SuperAdmin)));
    }
}
