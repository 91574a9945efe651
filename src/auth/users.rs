//! Fixed in-memory user list backing the login endpoint.

use std::collections::HashMap;

use super::{Identity, Role};
use crate::config::UserRecord;

/// Looks up users by name and checks their passwords.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<String, (String, Role)>,
}

impl UserDirectory {
    pub fn new(records: &[UserRecord]) -> Self {
        let users = records
            .iter()
            .map(|r| (r.username.clone(), (r.password.clone(), r.role)))
            .collect();
        Self { users }
    }

    /// Returns the identity for a matching username/password pair.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Identity> {
        match self.users.get(username) {
            Some((expected, role)) if expected == password => {
                Some(Identity::new(username, *role))
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
