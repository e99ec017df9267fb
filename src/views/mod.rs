pub mod admin;
pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod roles;
pub mod teams;

use crate::auth::AuthenticatedIdentity;
use crate::models::RoleName;

/// Top navigation shown on every signed-in page.
pub struct Nav {
    pub home: String,
    pub full_name: String,
    pub role_label: String,
    pub links: Vec<NavLink>,
}

pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
}

impl Nav {
    pub fn for_identity(identity: &AuthenticatedIdentity) -> Self {
        Self {
            home: identity.role.landing_path().to_string(),
            full_name: identity.full_name.clone(),
            role_label: identity.role.label().to_string(),
            links: nav_links(identity.role),
        }
    }
}

fn nav_links(role: RoleName) -> Vec<NavLink> {
    let mut links = vec![link(role.landing_path(), "Dashboard")];
    match role {
        RoleName::SuperAdmin => links.extend([
            link("/super-admin/users", "Users"),
            link("/super-admin/roles", "Roles"),
            link("/super-admin/permissions", "Permissions"),
            link("/super-admin/teams", "Teams"),
            link("/super-admin/audit-logs", "Audit log"),
        ]),
        RoleName::Admin => links.extend([
            link("/admin/users", "Users"),
            link("/team-leader/team", "My team"),
        ]),
        RoleName::TeamLeader => links.push(link("/team-leader/team", "My team")),
        RoleName::TeamMember | RoleName::IndividualUser => {}
    }
    links.push(link("/auth/profile", "Profile"));
    links
}

fn link(href: &'static str, label: &'static str) -> NavLink {
    NavLink { href, label }
}

/// An `<option>` in a select box.
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Parses an optional numeric id from a form select, where "" means none.
pub fn parse_optional_id(raw: &str) -> Result<Option<i64>, crate::error::AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| crate::error::AppError::Validation(format!("Invalid id '{raw}'")))
}
