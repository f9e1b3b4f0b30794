//! Role registry: the source of truth for role names and each user's
//! assigned role. Backed by the profiles table.

use crate::acl;
use crate::error::{DenyReason, Error, Result};
use crate::store::Store;
use crate::types::Profile;

/// Reserved role with every capability; its ACL rows are immutable.
pub const ADMIN_ROLE: &str = "admin";

/// Default role assigned by `ensure_profile`.
pub const GUEST_ROLE: &str = "guest";

/// Returns the stored role of a user, or `user_doesnt_exist`.
pub fn role_of(store: &dyn Store, username: &str) -> Result<String> {
    store
        .get_profile(username)?
        .map(|p| p.role)
        .ok_or(Error::Denied(DenyReason::UserDoesntExist))
}

/// Idempotent: creates the profile with role "guest" if absent and returns
/// the (possibly new) row.
pub fn ensure_profile(store: &dyn Store, username: &str) -> Result<Profile> {
    store.ensure_profile(username)
}

/// Sets or updates a user's role and materializes default space ACL rows
/// for the role in every existing space. Caller authorization is enforced
/// by the evaluator.
pub fn set_role(store: &dyn Store, username: &str, role: &str) -> Result<()> {
    if store.get_profile(username)?.is_none() {
        return Err(Error::Denied(DenyReason::UserDoesntExist));
    }
    store.set_role(username, role)?;
    acl::global::ensure_row(store, role)?;
    acl::space::ensure_entries(store, role)?;
    Ok(())
}

/// Unique non-empty role names currently in use. "admin" and "guest" are
/// always reported even when no profile holds them.
pub fn distinct_roles(store: &dyn Store) -> Result<Vec<String>> {
    let mut roles = store.distinct_roles()?;
    for reserved in [ADMIN_ROLE, GUEST_ROLE] {
        if !roles.iter().any(|r| r == reserved) {
            roles.push(reserved.to_string());
        }
    }
    roles.sort();
    Ok(roles)
}

pub fn role_exists(store: &dyn Store, role: &str) -> Result<bool> {
    Ok(distinct_roles(store)?.iter().any(|r| r == role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::SpaceCapability;

    fn store() -> SqliteStore {
        let s = SqliteStore::open_in_memory().unwrap();
        s.initialize().unwrap();
        s
    }

    #[test]
    fn test_reserved_roles_always_exist() {
        let s = store();
        assert!(role_exists(&s, "admin").unwrap());
        assert!(role_exists(&s, "guest").unwrap());
        assert!(!role_exists(&s, "moderator").unwrap());
    }

    #[test]
    fn test_set_role_materializes_space_acl_rows() {
        let s = store();
        s.ensure_profile("alice").unwrap();
        let space = crate::types::Space {
            id: "s1".into(),
            name: "general".into(),
            invisible: false,
            joinable: true,
            description: None,
            picture: None,
            members: vec![],
            admins: vec![],
            invites: vec![],
            requests: vec![],
            files: vec![],
            created_at: chrono::Utc::now(),
        };
        s.create_space(&space).unwrap();

        set_role(&s, "alice", "moderator").unwrap();

        assert_eq!(role_of(&s, "alice").unwrap(), "moderator");
        let row = s.get_space_acl("moderator", "s1").unwrap().unwrap();
        assert_eq!(row.caps, SpaceCapability::default());
    }

    #[test]
    fn test_set_role_unknown_user_is_denied() {
        let s = store();
        let err = set_role(&s, "ghost", "user").unwrap_err();
        assert!(matches!(
            err,
            Error::Denied(DenyReason::UserDoesntExist)
        ));
    }
}
