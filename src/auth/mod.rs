pub mod credentials;
pub mod gate;
pub mod guard;
pub mod identity;
pub mod jwt;
pub mod password;
pub mod session;

pub use identity::AuthenticatedIdentity;
