//! `revive-auth`: accounts, approval workflow and login sessions.
//!
//! This crate is intentionally decoupled from the console and from storage.

pub mod authorize;
pub mod directory;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod session;
pub mod user;

pub use authorize::{authorize, AuthzError};
pub use directory::UserDirectory;
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
pub use session::{AuthSession, SessionState};
pub use user::{Registration, UserAccount};
