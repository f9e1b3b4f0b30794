use crate::error::{DenyReason, Error, Result};
use crate::roles::ADMIN_ROLE;
use crate::store::Store;
use crate::types::{Principal, Space, SpaceAclRow, SpaceCapability};

pub fn get(store: &dyn Store, role: &str, space_id: &str) -> Result<Option<SpaceAclRow>> {
    store.get_space_acl(role, space_id)
}

pub fn get_all(store: &dyn Store, space_id: &str) -> Result<Vec<SpaceAclRow>> {
    store.list_space_acl(space_id)
}

/// Replaces all capabilities of a (role, space) row. The "admin" row is
/// immutable in every space.
pub fn set_all(store: &dyn Store, row: &SpaceAclRow) -> Result<()> {
    if row.role == ADMIN_ROLE {
        return Err(Error::Denied(DenyReason::AdminRoleImmutable));
    }
    store.upsert_space_acl(row)
}

/// All capabilities false; idempotent.
pub fn insert_default(store: &dyn Store, role: &str, space_id: &str) -> Result<()> {
    if store.get_space_acl(role, space_id)?.is_none() {
        store.upsert_space_acl(&SpaceAclRow {
            role: role.to_string(),
            space_id: space_id.to_string(),
            caps: SpaceCapability::default(),
        })?;
    }
    Ok(())
}

/// All capabilities true for the "admin" role in this space; idempotent.
pub fn insert_admin(store: &dyn Store, space_id: &str) -> Result<()> {
    store.upsert_space_acl(&SpaceAclRow {
        role: ADMIN_ROLE.to_string(),
        space_id: space_id.to_string(),
        caps: SpaceCapability::all(),
    })
}

/// Materializes the row a role should have in every existing space. Called
/// when a role is created or assigned so later asks find their row.
pub fn ensure_entries(store: &dyn Store, role: &str) -> Result<()> {
    for space in store.list_spaces()? {
        if role == ADMIN_ROLE {
            insert_admin(store, &space.id)?;
        } else {
            insert_default(store, role, &space.id)?;
        }
    }
    Ok(())
}

/// Materializes the row backing a user who just became a member: admin
/// template when their global role is "admin", default otherwise.
pub fn ensure_member_row(store: &dyn Store, global_role: &str, space_id: &str) -> Result<()> {
    if global_role == ADMIN_ROLE {
        insert_admin(store, space_id)
    } else {
        insert_default(store, global_role, space_id)
    }
}

/// Capability check for a user against a space, applying the effective-role
/// precedence: space admins answer from the implicit all-true admin row;
/// everyone else answers from the (global role, space) row. Non-members are
/// gated behind `join_space`; asking any other capability for a non-member
/// answers false.
pub fn ask(
    store: &dyn Store,
    principal: &Principal,
    space: &Space,
    capability: SpaceCapability,
) -> Result<bool> {
    if space.is_admin(&principal.username) {
        return Ok(true);
    }

    let row = match store.get_space_acl(&principal.global_role, &space.id)? {
        Some(row) => row,
        None => repair(store, &principal.global_role, &space.id)?,
    };

    if !space.is_member(&principal.username) && capability != SpaceCapability::JOIN_SPACE {
        return Ok(false);
    }
    Ok(row.caps.has(capability))
}

fn repair(store: &dyn Store, role: &str, space_id: &str) -> Result<SpaceAclRow> {
    tracing::warn!(role, space_id, "space ACL row missing, inserting default");
    let caps = if role == ADMIN_ROLE {
        SpaceCapability::all()
    } else {
        SpaceCapability::default()
    };
    let row = SpaceAclRow {
        role: role.to_string(),
        space_id: space_id.to_string(),
        caps,
    };
    store.upsert_space_acl(&row)?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn store_with_space() -> SqliteStore {
        let s = SqliteStore::open_in_memory().unwrap();
        s.initialize().unwrap();
        s.create_space(&crate::types::Space {
            id: "s1".into(),
            name: "general".into(),
            invisible: false,
            joinable: true,
            description: None,
            picture: None,
            members: vec!["alice".into(), "bob".into()],
            admins: vec!["alice".into()],
            invites: vec![],
            requests: vec![],
            files: vec![],
            created_at: chrono::Utc::now(),
        })
        .unwrap();
        s
    }

    fn principal(username: &str, role: &str) -> Principal {
        Principal {
            user_id: format!("id-{username}"),
            username: username.into(),
            email: None,
            global_role: role.into(),
        }
    }

    #[test]
    fn test_space_admin_short_circuits_true() {
        let s = store_with_space();
        let space = s.get_space("s1").unwrap().unwrap();
        let alice = principal("alice", "user");
        assert!(ask(&s, &alice, &space, SpaceCapability::WRITE_FILES).unwrap());
    }

    #[test]
    fn test_member_answers_from_role_row() {
        let s = store_with_space();
        let space = s.get_space("s1").unwrap().unwrap();
        let bob = principal("bob", "user");

        // First ask repairs the missing row to all-false.
        assert!(!ask(&s, &bob, &space, SpaceCapability::POST).unwrap());
        let row = s.get_space_acl("user", "s1").unwrap().unwrap();
        assert_eq!(row.caps, SpaceCapability::default());

        s.upsert_space_acl(&SpaceAclRow {
            role: "user".into(),
            space_id: "s1".into(),
            caps: SpaceCapability::POST,
        })
        .unwrap();
        assert!(ask(&s, &bob, &space, SpaceCapability::POST).unwrap());
    }

    #[test]
    fn test_outsider_only_gets_join_space_gate() {
        let s = store_with_space();
        let space = s.get_space("s1").unwrap().unwrap();
        let carol = principal("carol", "user");

        s.upsert_space_acl(&SpaceAclRow {
            role: "user".into(),
            space_id: "s1".into(),
            caps: SpaceCapability::JOIN_SPACE.union(SpaceCapability::READ_TIMELINE),
        })
        .unwrap();

        assert!(ask(&s, &carol, &space, SpaceCapability::JOIN_SPACE).unwrap());
        assert!(!ask(&s, &carol, &space, SpaceCapability::READ_TIMELINE).unwrap());
    }

    #[test]
    fn test_global_admin_repairs_full_row() {
        let s = store_with_space();
        let space = s.get_space("s1").unwrap().unwrap();
        let root = principal("root", "admin");

        // Not a space admin or member, but the admin role row is all-true,
        // so the join gate passes.
        assert!(ask(&s, &root, &space, SpaceCapability::JOIN_SPACE).unwrap());
        let row = s.get_space_acl("admin", "s1").unwrap().unwrap();
        assert_eq!(row.caps, SpaceCapability::all());
    }

    #[test]
    fn test_set_all_admin_row_rejected() {
        let s = store_with_space();
        let err = set_all(
            &s,
            &SpaceAclRow {
                role: "admin".into(),
                space_id: "s1".into(),
                caps: SpaceCapability::default(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Denied(DenyReason::AdminRoleImmutable)));
    }
}
