use crate::error::{DenyReason, Error, Result};
use crate::roles::ADMIN_ROLE;
use crate::store::Store;
use crate::types::{GlobalAclRow, GlobalCapability};

pub fn get(store: &dyn Store, role: &str) -> Result<Option<GlobalAclRow>> {
    store.get_global_acl(role)
}

pub fn get_all(store: &dyn Store) -> Result<Vec<GlobalAclRow>> {
    store.list_global_acl()
}

/// Replaces all capabilities of a role. The "admin" row is immutable.
pub fn set_all(store: &dyn Store, row: &GlobalAclRow) -> Result<()> {
    if row.role == ADMIN_ROLE {
        return Err(Error::Denied(DenyReason::AdminRoleImmutable));
    }
    store.upsert_global_acl(row)
}

/// All capabilities false; idempotent (existing rows are left alone).
pub fn insert_default(store: &dyn Store, role: &str) -> Result<()> {
    if store.get_global_acl(role)?.is_none() {
        store.upsert_global_acl(&GlobalAclRow {
            role: role.to_string(),
            caps: GlobalCapability::default(),
        })?;
    }
    Ok(())
}

/// All capabilities true for the "admin" role; idempotent.
pub fn insert_admin(store: &dyn Store) -> Result<()> {
    store.upsert_global_acl(&GlobalAclRow {
        role: ADMIN_ROLE.to_string(),
        caps: GlobalCapability::all(),
    })
}

/// Materializes the correct row for a role (admin template for "admin").
pub fn ensure_row(store: &dyn Store, role: &str) -> Result<()> {
    if role == ADMIN_ROLE {
        insert_admin(store)
    } else {
        insert_default(store, role)
    }
}

/// Returns the stored value for (role, capability). A missing row is an
/// inconsistency: it is repaired in place and the repaired row answers.
pub fn ask(store: &dyn Store, role: &str, capability: GlobalCapability) -> Result<bool> {
    let row = match store.get_global_acl(role)? {
        Some(row) => row,
        None => repair(store, role)?,
    };
    Ok(row.caps.has(capability))
}

fn repair(store: &dyn Store, role: &str) -> Result<GlobalAclRow> {
    tracing::warn!(role, "global ACL row missing, inserting default");
    let caps = if role == ADMIN_ROLE {
        GlobalCapability::all()
    } else {
        GlobalCapability::default()
    };
    let row = GlobalAclRow {
        role: role.to_string(),
        caps,
    };
    store.upsert_global_acl(&row)?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn store() -> SqliteStore {
        let s = SqliteStore::open_in_memory().unwrap();
        s.initialize().unwrap();
        s
    }

    #[test]
    fn test_ask_repairs_missing_row() {
        let s = store();
        assert!(s.get_global_acl("newrole").unwrap().is_none());

        let allowed = ask(&s, "newrole", GlobalCapability::CREATE_SPACE).unwrap();
        assert!(!allowed);

        let row = s.get_global_acl("newrole").unwrap().unwrap();
        assert_eq!(row.caps, GlobalCapability::default());
    }

    #[test]
    fn test_ask_repairs_admin_with_full_row() {
        let s = store();
        assert!(ask(&s, "admin", GlobalCapability::CREATE_SPACE).unwrap());
        let row = s.get_global_acl("admin").unwrap().unwrap();
        assert_eq!(row.caps, GlobalCapability::all());
    }

    #[test]
    fn test_set_all_admin_rejected() {
        let s = store();
        insert_admin(&s).unwrap();
        let err = set_all(
            &s,
            &GlobalAclRow {
                role: "admin".into(),
                caps: GlobalCapability::default(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Denied(DenyReason::AdminRoleImmutable)));

        // No write happened.
        let row = s.get_global_acl("admin").unwrap().unwrap();
        assert_eq!(row.caps, GlobalCapability::all());
    }

    #[test]
    fn test_insert_default_does_not_clobber() {
        let s = store();
        store_row(&s, "user", GlobalCapability::CREATE_SPACE);
        insert_default(&s, "user").unwrap();
        assert!(ask(&s, "user", GlobalCapability::CREATE_SPACE).unwrap());
    }

    fn store_row(s: &dyn Store, role: &str, caps: GlobalCapability) {
        s.upsert_global_acl(&GlobalAclRow {
            role: role.into(),
            caps,
        })
        .unwrap();
    }
}
