//! Space model and membership state machine. Every membership edge moves
//! through the transitions here; handlers authorize first, then call one
//! transition, then re-read the space for the response.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::acl;
use crate::error::{DenyReason, Error, Result};
use crate::notify::NotificationEvent;
use crate::store::Store;
use crate::types::{NotificationKind, Principal, Space};

/// How a `join` call resolved: straight to membership, or downgraded to a
/// pending request when the space is not directly joinable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOutcome {
    Joined,
    RequestedJoin,
}

/// Creates a space with the actor as sole member and sole admin, and seeds
/// the ACL rows the new space needs.
pub fn create_space(
    store: &dyn Store,
    actor: &Principal,
    name: &str,
    invisible: bool,
    joinable: bool,
) -> Result<Space> {
    let space = Space {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        invisible,
        joinable,
        description: None,
        picture: None,
        members: vec![actor.username.clone()],
        admins: vec![actor.username.clone()],
        invites: vec![],
        requests: vec![],
        files: vec![],
        created_at: Utc::now(),
    };
    store.create_space(&space)?;
    acl::space::insert_admin(store, &space.id)?;
    acl::space::ensure_member_row(store, &actor.global_role, &space.id)?;
    Ok(space)
}

/// OUTSIDER → MEMBER when the space is joinable and the actor's role grants
/// `join_space`; otherwise falls back to a join request. A pending invite is
/// consumed as an acceptance.
pub fn join(
    store: &dyn Store,
    actor: &Principal,
    space: &Space,
) -> Result<(JoinOutcome, Vec<NotificationEvent>)> {
    if space.is_member(&actor.username) {
        return Err(Error::Denied(DenyReason::UserAlreadyMember));
    }
    if space.is_invited(&actor.username) {
        accept_invite(store, actor, space)?;
        return Ok((JoinOutcome::Joined, vec![]));
    }

    let can_join = space.joinable
        && acl::space::ask(store, actor, space, crate::types::SpaceCapability::JOIN_SPACE)?;
    if can_join {
        enter_member(store, &actor.username, &actor.global_role, space)?;
        return Ok((JoinOutcome::Joined, vec![]));
    }

    let events = request_join(store, actor, space)?;
    Ok((JoinOutcome::RequestedJoin, events))
}

/// OUTSIDER → REQUESTED. Fires a notification to every space admin; on a
/// duplicate request the state is unchanged and nothing fires.
pub fn request_join(
    store: &dyn Store,
    actor: &Principal,
    space: &Space,
) -> Result<Vec<NotificationEvent>> {
    if space.is_member(&actor.username) {
        return Err(Error::Denied(DenyReason::UserAlreadyMember));
    }
    let newly_added = store.add_request(&space.id, &actor.username)?;
    if !newly_added {
        return Ok(vec![]);
    }
    Ok(space
        .admins
        .iter()
        .map(|admin| NotificationEvent {
            kind: NotificationKind::JoinRequest,
            actor: actor.username.clone(),
            recipient: admin.clone(),
            space_id: space.id.clone(),
            space_name: space.name.clone(),
        })
        .collect())
}

/// OUTSIDER → INVITED by a space admin. Re-inviting is a no-op and does not
/// re-fire the notification. A pending request from the target is consumed;
/// the sets stay disjoint.
pub fn invite(
    store: &dyn Store,
    actor: &Principal,
    space: &Space,
    target: &str,
) -> Result<Vec<NotificationEvent>> {
    if space.is_member(target) {
        return Err(Error::Denied(DenyReason::UserAlreadyMember));
    }
    // The invitee may not have logged in yet; give them a guest profile so
    // role lookups work when they accept.
    store.ensure_profile(target)?;
    store.remove_request(&space.id, target)?;
    let newly_added = store.add_invite(&space.id, target)?;
    if !newly_added {
        return Ok(vec![]);
    }
    Ok(vec![NotificationEvent {
        kind: NotificationKind::Invite,
        actor: actor.username.clone(),
        recipient: target.to_string(),
        space_id: space.id.clone(),
        space_name: space.name.clone(),
    }])
}

/// INVITED → OUTSIDER by an admin.
pub fn revoke_invite(store: &dyn Store, space: &Space, target: &str) -> Result<()> {
    if !store.remove_invite(&space.id, target)? {
        return Err(Error::Denied(DenyReason::UserIsNotInvitedIntoSpace));
    }
    Ok(())
}

/// INVITED → MEMBER by the invited user.
pub fn accept_invite(store: &dyn Store, actor: &Principal, space: &Space) -> Result<()> {
    if !space.is_invited(&actor.username) {
        return Err(Error::Denied(DenyReason::UserIsNotInvitedIntoSpace));
    }
    enter_member(store, &actor.username, &actor.global_role, space)
}

/// INVITED → OUTSIDER by the invited user.
pub fn decline_invite(store: &dyn Store, actor: &Principal, space: &Space) -> Result<()> {
    if !store.remove_invite(&space.id, &actor.username)? {
        return Err(Error::Denied(DenyReason::UserIsNotInvitedIntoSpace));
    }
    Ok(())
}

/// REQUESTED → MEMBER by an admin.
pub fn accept_request(store: &dyn Store, space: &Space, target: &str) -> Result<()> {
    if !space.has_requested(target) {
        return Err(Error::Denied(DenyReason::UserDidntRequestToJoin));
    }
    let role = store.ensure_profile(target)?.role;
    enter_member(store, target, &role, space)
}

/// REQUESTED → OUTSIDER by an admin.
pub fn reject_request(store: &dyn Store, space: &Space, target: &str) -> Result<()> {
    if !store.remove_request(&space.id, target)? {
        return Err(Error::Denied(DenyReason::UserDidntRequestToJoin));
    }
    Ok(())
}

/// REQUESTED → OUTSIDER by the requester themselves.
pub fn revoke_request(store: &dyn Store, actor: &Principal, space: &Space) -> Result<()> {
    if !store.remove_request(&space.id, &actor.username)? {
        return Err(Error::Denied(DenyReason::UserDidntRequestToJoin));
    }
    Ok(())
}

/// MEMBER → OUTSIDER. The sole admin cannot leave.
pub fn leave(store: &dyn Store, actor: &Principal, space: &Space) -> Result<()> {
    remove_from_space(store, space, &actor.username)
}

/// MEMBER → OUTSIDER by an admin. The last-admin rule applies to admin
/// targets; the evaluator already required a global admin for those.
pub fn kick(store: &dyn Store, space: &Space, target: &str) -> Result<()> {
    remove_from_space(store, space, target)
}

fn remove_from_space(store: &dyn Store, space: &Space, username: &str) -> Result<()> {
    if !space.is_member(username) {
        return Err(Error::Denied(DenyReason::UserNotMemberOfSpace));
    }
    if space.is_admin(username) && space.admins.len() == 1 {
        return Err(Error::Denied(DenyReason::NoOtherAdminsLeft));
    }
    store.remove_member(&space.id, username)?;
    Ok(())
}

/// MEMBER → ADMIN. The target gets the admin ACL row for this space.
pub fn add_admin(store: &dyn Store, space: &Space, target: &str) -> Result<()> {
    if !space.is_member(target) {
        return Err(Error::Denied(DenyReason::UserNotMemberOfSpace));
    }
    if space.is_admin(target) {
        return Err(Error::Denied(DenyReason::UserAlreadyAdmin));
    }
    store.set_space_admin(&space.id, target, true)?;
    acl::space::insert_admin(store, &space.id)?;
    Ok(())
}

/// ADMIN → MEMBER, global admin only (enforced in the evaluator); the last
/// admin cannot be demoted.
pub fn remove_admin(store: &dyn Store, space: &Space, target: &str) -> Result<()> {
    if !space.is_admin(target) {
        return Err(Error::Denied(DenyReason::UserIsNotAdmin));
    }
    if space.admins.len() == 1 {
        return Err(Error::Denied(DenyReason::NoOtherAdminsLeft));
    }
    store.set_space_admin(&space.id, target, false)?;
    Ok(())
}

pub fn toggle_visibility(store: &dyn Store, space: &Space) -> Result<Space> {
    let mut updated = space.clone();
    updated.invisible = !updated.invisible;
    store.update_space(&updated)?;
    Ok(updated)
}

pub fn toggle_joinability(store: &dyn Store, space: &Space) -> Result<Space> {
    let mut updated = space.clone();
    updated.joinable = !updated.joinable;
    store.update_space(&updated)?;
    Ok(updated)
}

pub fn update_info(
    store: &dyn Store,
    space: &Space,
    description: Option<String>,
    picture: Option<String>,
) -> Result<Space> {
    let mut updated = space.clone();
    if description.is_some() {
        updated.description = description;
    }
    if picture.is_some() {
        updated.picture = picture;
    }
    store.update_space(&updated)?;
    Ok(updated)
}

/// Entering MEMBER invariably materializes the user's ACL row for the space
/// and clears any invite or request edge left over from the entry path.
fn enter_member(store: &dyn Store, username: &str, global_role: &str, space: &Space) -> Result<()> {
    store.remove_invite(&space.id, username)?;
    store.remove_request(&space.id, username)?;
    store.add_member(&space.id, username)?;
    acl::space::ensure_member_row(store, global_role, &space.id)?;
    Ok(())
}
