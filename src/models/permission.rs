use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fine-grained capabilities assignable to roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionName {
    ManageAllUsers,
    ManageTeamUsers,
    ViewUsers,
    ManageRoles,
    ViewRoles,
    ManagePermissions,
    ViewPermissions,
    ManageAllExpenses,
    ManageTeamExpenses,
    ManageOwnExpenses,
    ViewExpenses,
    ManageAllBudgets,
    ManageTeamBudgets,
    ManageOwnBudgets,
    ViewBudgets,
    ManageTeams,
    ViewTeams,
    ManageSavings,
    ViewSavings,
    ManageNotifications,
    ViewNotifications,
}

impl PermissionName {
    pub const ALL: [PermissionName; 21] = [
        PermissionName::ManageAllUsers,
        PermissionName::ManageTeamUsers,
        PermissionName::ViewUsers,
        PermissionName::ManageRoles,
        PermissionName::ViewRoles,
        PermissionName::ManagePermissions,
        PermissionName::ViewPermissions,
        PermissionName::ManageAllExpenses,
        PermissionName::ManageTeamExpenses,
        PermissionName::ManageOwnExpenses,
        PermissionName::ViewExpenses,
        PermissionName::ManageAllBudgets,
        PermissionName::ManageTeamBudgets,
        PermissionName::ManageOwnBudgets,
        PermissionName::ViewBudgets,
        PermissionName::ManageTeams,
        PermissionName::ViewTeams,
        PermissionName::ManageSavings,
        PermissionName::ViewSavings,
        PermissionName::ManageNotifications,
        PermissionName::ViewNotifications,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionName::ManageAllUsers => "manage_all_users",
            PermissionName::ManageTeamUsers => "manage_team_users",
            PermissionName::ViewUsers => "view_users",
            PermissionName::ManageRoles => "manage_roles",
            PermissionName::ViewRoles => "view_roles",
            PermissionName::ManagePermissions => "manage_permissions",
            PermissionName::ViewPermissions => "view_permissions",
            PermissionName::ManageAllExpenses => "manage_all_expenses",
            PermissionName::ManageTeamExpenses => "manage_team_expenses",
            PermissionName::ManageOwnExpenses => "manage_own_expenses",
            PermissionName::ViewExpenses => "view_expenses",
            PermissionName::ManageAllBudgets => "manage_all_budgets",
            PermissionName::ManageTeamBudgets => "manage_team_budgets",
            PermissionName::ManageOwnBudgets => "manage_own_budgets",
            PermissionName::ViewBudgets => "view_budgets",
            PermissionName::ManageTeams => "manage_teams",
            PermissionName::ViewTeams => "view_teams",
            PermissionName::ManageSavings => "manage_savings",
            PermissionName::ViewSavings => "view_savings",
            PermissionName::ManageNotifications => "manage_notifications",
            PermissionName::ViewNotifications => "view_notifications",
        }
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPermission(pub String);

impl fmt::Display for UnknownPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown permission '{}'", self.0)
    }
}

impl std::error::Error for UnknownPermission {}

impl FromStr for PermissionName {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionName::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_names_are_unique_and_parse_back() {
        let names: HashSet<&str> = PermissionName::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(names.len(), PermissionName::ALL.len());
        for p in PermissionName::ALL {
            assert_eq!(p.as_str().parse::<PermissionName>(), Ok(p));
        }
    }

    #[test]
    fn unknown_permission_is_an_error() {
        assert!("drop_tables".parse::<PermissionName>().is_err());
    }
}
