pub mod audit_event;
pub mod permission;
pub mod role;
pub mod team;
pub mod user;

pub use audit_event::AuditEvent;
pub use permission::{Permission, PermissionName};
pub use role::{Role, RoleName};
pub use team::Team;
pub use user::{NewUser, User, UserUpdate};
