//! Authentication and authorization.
//!
//! # Responsibilities
//! - Issue and verify bearer tokens (token.rs)
//! - Gate routes by role (roles.rs)
//! - Check login credentials against the configured users (users.rs)
//!
//! Every check here is a pure function of its inputs; request plumbing lives
//! in `http::middleware`.

mod identity;
mod roles;
mod token;
mod users;

pub use identity::{Identity, Role, RoleSet};
pub use roles::authorize;
pub use token::{Claims, TokenVerifier};
pub use users::UserDirectory;
