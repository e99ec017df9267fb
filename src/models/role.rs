use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of access tiers. Every user holds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    SuperAdmin,
    Admin,
    TeamLeader,
    TeamMember,
    IndividualUser,
}

impl RoleName {
    pub const ALL: [RoleName; 5] = [
        RoleName::SuperAdmin,
        RoleName::Admin,
        RoleName::TeamLeader,
        RoleName::TeamMember,
        RoleName::IndividualUser,
    ];

    /// Role assigned to self-registered accounts.
    pub const DEFAULT: RoleName = RoleName::IndividualUser;

    /// Roles a team leader may recruit into their team.
    pub const RECRUITABLE: [RoleName; 2] = [RoleName::TeamMember, RoleName::IndividualUser];

    pub fn as_str(self) -> &'static str {
        match self {
            RoleName::SuperAdmin => "super_admin",
            RoleName::Admin => "admin",
            RoleName::TeamLeader => "team_leader",
            RoleName::TeamMember => "team_member",
            RoleName::IndividualUser => "individual_user",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoleName::SuperAdmin => "Super Admin",
            RoleName::Admin => "Admin",
            RoleName::TeamLeader => "Team Leader",
            RoleName::TeamMember => "Team Member",
            RoleName::IndividualUser => "Individual User",
        }
    }

    /// URL prefix of the role's section of the site.
    pub fn route_prefix(self) -> &'static str {
        match self {
            RoleName::SuperAdmin => "/super-admin",
            RoleName::Admin => "/admin",
            RoleName::TeamLeader => "/team-leader",
            RoleName::TeamMember => "/team-member",
            RoleName::IndividualUser => "/user",
        }
    }

    /// Where a freshly logged-in user of this role lands.
    pub fn landing_path(self) -> &'static str {
        match self {
            RoleName::SuperAdmin => "/super-admin/dashboard",
            RoleName::Admin => "/admin/dashboard",
            RoleName::TeamLeader => "/team-leader/dashboard",
            RoleName::TeamMember => "/team-member/dashboard",
            RoleName::IndividualUser => "/user/dashboard",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for RoleName {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleName::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Role {
    pub fn role_name(&self) -> Result<RoleName, UnknownRole> {
        self.name.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for role in RoleName::ALL {
            assert_eq!(role.as_str().parse::<RoleName>(), Ok(role));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            "Super_Admin".parse::<RoleName>(),
            Err(UnknownRole("Super_Admin".to_string()))
        );
        assert!("".parse::<RoleName>().is_err());
    }

    #[test]
    fn landing_paths_live_under_role_prefix() {
        for role in RoleName::ALL {
            assert_eq!(
                role.landing_path(),
                format!("{}/dashboard", role.route_prefix())
            );
        }
        assert_eq!(RoleName::DEFAULT.landing_path(), "/user/dashboard");
    }

    #[test]
    fn only_members_and_individuals_are_recruitable() {
        assert!(RoleName::RECRUITABLE.contains(&RoleName::DEFAULT));
        assert!(!RoleName::RECRUITABLE.contains(&RoleName::TeamLeader));
        assert!(!RoleName::RECRUITABLE.contains(&RoleName::Admin));
        assert!(!RoleName::RECRUITABLE.contains(&RoleName::SuperAdmin));
    }
}
