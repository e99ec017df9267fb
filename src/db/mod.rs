pub mod audit;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod teams;
pub mod users;

/// True when the error is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
