//! The single authorization decision point. Every handler calls
//! [`authorize`] before touching state; the fixed precedence is: missing
//! authentication, missing space, admin-only gate, space-admin gate,
//! capability gate, membership gate. State-machine preconditions come after,
//! inside the transitions themselves.

use crate::acl;
use crate::error::{DenyReason, Error, Result};
use crate::store::Store;
use crate::types::{GlobalCapability, Principal, Space, SpaceCapability};

/// Everything a principal can attempt. The classification methods below are
/// the data the evaluator runs on; adding an action means placing it in
/// exactly one bucket here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Capability-gated, global
    CreateSpace,

    // Admin-only
    ListAllSpaces,
    ViewFullTimeline,
    SetRole,
    ViewRoles,
    UpdateGlobalAcl,
    RemoveSpaceAdmin,
    ViewReports,
    CloseReport,
    /// Kicking a space admin needs a global admin.
    KickAdmin,

    // Space-admin-or-global-admin
    ViewSpaceInternals,
    InviteUser,
    AcceptRequest,
    RejectRequest,
    RevokeInvite,
    ToggleVisibility,
    ToggleJoinability,
    UpdateSpaceInfo,
    KickMember,
    DeleteSpace,
    AddSpaceAdmin,
    UpdateSpaceAcl,
    DeleteOtherFile,

    // Capability-gated, per space
    JoinSpace,
    ReadTimeline,
    CreatePost,
    CreateComment,
    ReadWiki,
    WriteWiki,
    ReadFiles,
    WriteFiles,

    // Authenticated-only (no further gate)
    Leave,
    AcceptInvite,
    DeclineInvite,
    RevokeRequest,
    CreateReport,
    ViewSpace,
}

impl Action {
    const fn admin_only(self) -> bool {
        matches!(
            self,
            Action::ListAllSpaces
                | Action::ViewFullTimeline
                | Action::SetRole
                | Action::ViewRoles
                | Action::UpdateGlobalAcl
                | Action::RemoveSpaceAdmin
                | Action::ViewReports
                | Action::CloseReport
                | Action::KickAdmin
        )
    }

    const fn space_admin(self) -> bool {
        matches!(
            self,
            Action::ViewSpaceInternals
                | Action::InviteUser
                | Action::AcceptRequest
                | Action::RejectRequest
                | Action::RevokeInvite
                | Action::ToggleVisibility
                | Action::ToggleJoinability
                | Action::UpdateSpaceInfo
                | Action::KickMember
                | Action::DeleteSpace
                | Action::AddSpaceAdmin
                | Action::UpdateSpaceAcl
                | Action::DeleteOtherFile
        )
    }

    const fn global_capability(self) -> Option<GlobalCapability> {
        match self {
            Action::CreateSpace => Some(GlobalCapability::CREATE_SPACE),
            _ => None,
        }
    }

    const fn space_capability(self) -> Option<SpaceCapability> {
        match self {
            Action::JoinSpace => Some(SpaceCapability::JOIN_SPACE),
            Action::ReadTimeline => Some(SpaceCapability::READ_TIMELINE),
            Action::CreatePost => Some(SpaceCapability::POST),
            Action::CreateComment => Some(SpaceCapability::COMMENT),
            Action::ReadWiki => Some(SpaceCapability::READ_WIKI),
            Action::WriteWiki => Some(SpaceCapability::WRITE_WIKI),
            Action::ReadFiles => Some(SpaceCapability::READ_FILES),
            Action::WriteFiles => Some(SpaceCapability::WRITE_FILES),
            _ => None,
        }
    }

    /// Space-scoped content actions require membership on top of their
    /// capability. `JoinSpace` is the exception: it is exactly the
    /// outsider's gate.
    const fn requires_membership(self) -> bool {
        matches!(
            self,
            Action::ReadTimeline
                | Action::CreatePost
                | Action::CreateComment
                | Action::ReadWiki
                | Action::WriteWiki
                | Action::ReadFiles
                | Action::WriteFiles
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Global,
    Space(&'a str),
}

/// Applies the precedence rules in order and returns the loaded space for
/// space targets. First deny wins.
pub fn authorize(
    store: &dyn Store,
    principal: Option<&Principal>,
    action: Action,
    target: Target<'_>,
) -> Result<Option<Space>> {
    let Some(principal) = principal else {
        return Err(Error::Denied(DenyReason::NoLoggedInUser));
    };

    let space = match target {
        Target::Global => None,
        Target::Space(id) => Some(
            store
                .get_space(id)?
                .ok_or(Error::Denied(DenyReason::SpaceDoesntExist))?,
        ),
    };

    if action.admin_only() && !principal.is_global_admin() {
        return Err(Error::Denied(DenyReason::InsufficientPermission));
    }

    if action.space_admin() {
        let is_space_admin = space
            .as_ref()
            .is_some_and(|s| s.is_admin(&principal.username));
        if !is_space_admin && !principal.is_global_admin() {
            return Err(Error::Denied(DenyReason::InsufficientPermission));
        }
    }

    if let Some(cap) = action.global_capability() {
        if !acl::global::ask(store, &principal.global_role, cap)? {
            return Err(Error::Denied(DenyReason::InsufficientPermission));
        }
    }

    if let Some(cap) = action.space_capability() {
        let space = space.as_ref().ok_or(Error::Denied(DenyReason::SpaceDoesntExist))?;
        if !acl::space::ask(store, principal, space, cap)? {
            return Err(Error::Denied(DenyReason::InsufficientPermission));
        }
        if action.requires_membership() && !space.is_member(&principal.username) {
            return Err(Error::Denied(DenyReason::UserNotMemberOfSpace));
        }
    }

    Ok(space)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::{GlobalAclRow, SpaceAclRow};

    fn store() -> SqliteStore {
        let s = SqliteStore::open_in_memory().unwrap();
        s.initialize().unwrap();
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

    fn make_space(s: &dyn Store, id: &str, members: &[&str], admins: &[&str]) {
        s.create_space(&Space {
            id: id.into(),
            name: id.into(),
            invisible: false,
            joinable: true,
            description: None,
            picture: None,
            members: members.iter().map(|m| m.to_string()).collect(),
            admins: admins.iter().map(|a| a.to_string()).collect(),
            invites: vec![],
            requests: vec![],
            files: vec![],
            created_at: chrono::Utc::now(),
        })
        .unwrap();
    }

    #[test]
    fn test_unauthenticated_denied_first() {
        let s = store();
        let err = authorize(&s, None, Action::CreateSpace, Target::Global).unwrap_err();
        assert!(matches!(err, Error::Denied(DenyReason::NoLoggedInUser)));
    }

    #[test]
    fn test_missing_space_denied_before_permissions() {
        let s = store();
        let root = principal("root", "admin");
        let err = authorize(&s, Some(&root), Action::DeleteSpace, Target::Space("nope"))
            .unwrap_err();
        assert!(matches!(err, Error::Denied(DenyReason::SpaceDoesntExist)));
    }

    #[test]
    fn test_admin_only_requires_global_admin() {
        let s = store();
        let user = principal("alice", "user");
        let err = authorize(&s, Some(&user), Action::SetRole, Target::Global).unwrap_err();
        assert!(matches!(
            err,
            Error::Denied(DenyReason::InsufficientPermission)
        ));

        let root = principal("root", "admin");
        assert!(authorize(&s, Some(&root), Action::SetRole, Target::Global).is_ok());
    }

    #[test]
    fn test_space_admin_gate_accepts_global_admin() {
        let s = store();
        make_space(&s, "s1", &["alice", "bob"], &["alice"]);
        let bob = principal("bob", "user");
        let err = authorize(&s, Some(&bob), Action::DeleteSpace, Target::Space("s1"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Denied(DenyReason::InsufficientPermission)
        ));

        let alice = principal("alice", "user");
        assert!(authorize(&s, Some(&alice), Action::DeleteSpace, Target::Space("s1")).is_ok());

        let root = principal("root", "admin");
        assert!(authorize(&s, Some(&root), Action::DeleteSpace, Target::Space("s1")).is_ok());
    }

    #[test]
    fn test_global_capability_gate() {
        let s = store();
        let alice = principal("alice", "user");
        let err = authorize(&s, Some(&alice), Action::CreateSpace, Target::Global).unwrap_err();
        assert!(matches!(
            err,
            Error::Denied(DenyReason::InsufficientPermission)
        ));

        s.upsert_global_acl(&GlobalAclRow {
            role: "user".into(),
            caps: GlobalCapability::CREATE_SPACE,
        })
        .unwrap();
        assert!(authorize(&s, Some(&alice), Action::CreateSpace, Target::Global).is_ok());
    }

    #[test]
    fn test_capability_then_membership_order() {
        let s = store();
        make_space(&s, "s1", &["alice"], &["alice"]);
        s.upsert_space_acl(&SpaceAclRow {
            role: "user".into(),
            space_id: "s1".into(),
            caps: SpaceCapability::all(),
        })
        .unwrap();

        // Outsider with a permissive role row: capability ask answers false
        // for non-members on anything but join_space.
        let bob = principal("bob", "user");
        let err = authorize(&s, Some(&bob), Action::ReadTimeline, Target::Space("s1"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Denied(DenyReason::InsufficientPermission)
        ));

        // Member with the row: allowed, and the space comes back.
        let alice = principal("alice", "user");
        let space = authorize(&s, Some(&alice), Action::ReadTimeline, Target::Space("s1"))
            .unwrap()
            .unwrap();
        assert_eq!(space.id, "s1");
    }

    #[test]
    fn test_kick_admin_needs_global_admin() {
        let s = store();
        make_space(&s, "s1", &["alice", "bob"], &["alice", "bob"]);
        let alice = principal("alice", "user");
        let err = authorize(&s, Some(&alice), Action::KickAdmin, Target::Space("s1"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Denied(DenyReason::InsufficientPermission)
        ));

        let root = principal("root", "admin");
        assert!(authorize(&s, Some(&root), Action::KickAdmin, Target::Space("s1")).is_ok());
    }
}
