//! Role gate.

use super::{Identity, RoleSet};
use crate::error::AuthError;

/// Admit `identity` iff its role is in `allowed`.
pub fn authorize(identity: Option<&Identity>, allowed: &RoleSet) -> Result<(), AuthError> {
    let identity = identity.ok_or(AuthError::Unauthenticated)?;

    if allowed.contains(identity.role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn user_is_refused_admin_routes() {
        let user = Identity::new("bob", Role::User);

        assert_eq!(
            authorize(Some(&user), &RoleSet::of(&[Role::Admin])),
            Err(AuthError::InsufficientRole)
        );
        assert_eq!(authorize(Some(&user), &RoleSet::of(&[Role::User, Role::Admin])), Ok(()));
    }

    #[test]
    fn admin_passes_shared_routes() {
        let admin = Identity::new("root", Role::Admin);
        assert_eq!(authorize(Some(&admin), &RoleSet::of(&[Role::User, Role::Admin])), Ok(()));
        assert_eq!(
            authorize(Some(&admin), &RoleSet::of(&[Role::User])),
            Err(AuthError::InsufficientRole)
        );
    }

    #[test]
    fn missing_identity_is_unauthenticated() {
        assert_eq!(
            authorize(None, &RoleSet::of(&[Role::User])),
            Err(AuthError::Unauthenticated)
        );
    }
}
