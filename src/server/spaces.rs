use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{delete, get, post},
};
use serde::Serialize;

use crate::auth::RequireAuth;
use crate::authz::{Action, Target, authorize};
use crate::server::AppState;
use crate::server::dto::{CreateSpaceParams, SpaceInfoBody, SpaceParams, SpaceUserParams};
use crate::server::response::{ApiError, ApiResponse, ok_empty, require};
use crate::server::validation::validate_space_name;
use crate::spaces;
use crate::types::Space;

pub fn spaces_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(create))
        .route("/list", get(list))
        .route("/my", get(my))
        .route("/info", get(information))
        .route("/join", post(join))
        .route("/leave", delete(leave))
        .route("/invite", post(invite))
        .route("/revoke_invite", delete(revoke_invite))
        .route("/accept_invite", post(accept_invite))
        .route("/decline_invite", post(decline_invite))
        .route("/invites", get(invites))
        .route("/requests", get(requests))
        .route("/accept_request", post(accept_request))
        .route("/reject_request", delete(reject_request))
        .route("/revoke_request", delete(revoke_request))
        .route("/kick", delete(kick))
        .route("/add_admin", post(add_admin))
        .route("/remove_admin", delete(remove_admin))
        .route("/toggle_visibility", post(toggle_visibility))
        .route("/toggle_joinability", post(toggle_joinability))
        .route("/space_information", post(space_information))
        .route("/delete_space", delete(delete_space))
}

#[derive(Serialize)]
struct SpaceData {
    space: Space,
}

#[derive(Serialize)]
struct SpacesData {
    spaces: Vec<Space>,
}

#[derive(Serialize)]
struct JoinData {
    join_type: spaces::JoinOutcome,
}

#[derive(Serialize)]
struct UsersData {
    users: Vec<String>,
}

/// Strips the admin-only membership internals for non-privileged viewers.
fn public_view(mut space: Space) -> Space {
    space.invites.clear();
    space.requests.clear();
    space
}

async fn create(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<CreateSpaceParams>,
) -> Result<Json<ApiResponse<SpaceData>>, ApiError> {
    let name = require(params.name, "name")?;
    validate_space_name(&name)?;

    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::CreateSpace,
        Target::Global,
    )?;

    let space = spaces::create_space(
        state.store.as_ref(),
        &principal,
        name.trim(),
        params.invisible,
        params.joinable.unwrap_or(true),
    )?;
    Ok(ApiResponse::ok(SpaceData { space }))
}

async fn list(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SpacesData>>, ApiError> {
    let all = state.store.list_spaces()?;
    let spaces = if principal.is_global_admin() {
        all
    } else {
        all.into_iter()
            .filter(|s| s.is_member(&principal.username) || (!s.invisible && s.joinable))
            .map(public_view)
            .collect()
    };
    Ok(ApiResponse::ok(SpacesData { spaces }))
}

async fn my(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SpacesData>>, ApiError> {
    let spaces = state
        .store
        .list_spaces()?
        .into_iter()
        .filter(|s| s.is_member(&principal.username))
        .collect();
    Ok(ApiResponse::ok(SpacesData { spaces }))
}

async fn information(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<SpaceData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewSpace,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let privileged = principal.is_global_admin() || space.is_admin(&principal.username);
    if space.invisible && !space.is_member(&principal.username) && !privileged {
        return Err(crate::error::Error::Denied(crate::error::DenyReason::SpaceDoesntExist).into());
    }

    let space = if privileged { space } else { public_view(space) };
    Ok(ApiResponse::ok(SpaceData { space }))
}

async fn join(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<JoinData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewSpace,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let (join_type, events) = spaces::join(state.store.as_ref(), &principal, &space)?;
    state.notifier.enqueue(events);
    Ok(ApiResponse::ok(JoinData { join_type }))
}

async fn leave(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::Leave,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    spaces::leave(state.store.as_ref(), &principal, &space)?;
    Ok(ok_empty())
}

async fn invite(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceUserParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let user = require(params.user, "user")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::InviteUser,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let events = spaces::invite(state.store.as_ref(), &principal, &space, &user)?;
    // The rate cap drops the notification, never the invite itself.
    if state.invites.allow(&principal.username) {
        state.notifier.enqueue(events);
    } else {
        tracing::warn!(actor = %principal.username, "invite notification rate capped");
    }
    Ok(ok_empty())
}

async fn revoke_invite(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceUserParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let user = require(params.user, "user")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::RevokeInvite,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    spaces::revoke_invite(state.store.as_ref(), &space, &user)?;
    Ok(ok_empty())
}

async fn accept_invite(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::AcceptInvite,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    spaces::accept_invite(state.store.as_ref(), &principal, &space)?;
    Ok(ok_empty())
}

async fn decline_invite(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::DeclineInvite,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    spaces::decline_invite(state.store.as_ref(), &principal, &space)?;
    Ok(ok_empty())
}

async fn invites(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<UsersData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewSpaceInternals,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    Ok(ApiResponse::ok(UsersData {
        users: space.invites,
    }))
}

async fn requests(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<UsersData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewSpaceInternals,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    Ok(ApiResponse::ok(UsersData {
        users: space.requests,
    }))
}

async fn accept_request(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceUserParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let user = require(params.user, "user")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::AcceptRequest,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    spaces::accept_request(state.store.as_ref(), &space, &user)?;
    Ok(ok_empty())
}

async fn reject_request(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceUserParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let user = require(params.user, "user")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::RejectRequest,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    spaces::reject_request(state.store.as_ref(), &space, &user)?;
    Ok(ok_empty())
}

async fn revoke_request(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::RevokeRequest,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    spaces::revoke_request(state.store.as_ref(), &principal, &space)?;
    Ok(ok_empty())
}

async fn kick(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceUserParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let user = require(params.user, "user")?;

    // Kicking a space admin is reserved to global admins.
    let target_is_admin = state
        .store
        .get_space(&id)?
        .is_some_and(|s| s.is_admin(&user));
    let action = if target_is_admin {
        Action::KickAdmin
    } else {
        Action::KickMember
    };

    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        action,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    spaces::kick(state.store.as_ref(), &space, &user)?;
    Ok(ok_empty())
}

async fn add_admin(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceUserParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let user = require(params.user, "user")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::AddSpaceAdmin,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    spaces::add_admin(state.store.as_ref(), &space, &user)?;
    Ok(ok_empty())
}

async fn remove_admin(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceUserParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let user = require(params.user, "user")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::RemoveSpaceAdmin,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    spaces::remove_admin(state.store.as_ref(), &space, &user)?;
    Ok(ok_empty())
}

async fn toggle_visibility(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<SpaceData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ToggleVisibility,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let space = spaces::toggle_visibility(state.store.as_ref(), &space)?;
    Ok(ApiResponse::ok(SpaceData { space }))
}

async fn toggle_joinability(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<SpaceData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ToggleJoinability,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let space = spaces::toggle_joinability(state.store.as_ref(), &space)?;
    Ok(ApiResponse::ok(SpaceData { space }))
}

async fn space_information(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
    Json(body): Json<SpaceInfoBody>,
) -> Result<Json<ApiResponse<SpaceData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::UpdateSpaceInfo,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let space = spaces::update_info(state.store.as_ref(), &space, body.description, body.picture)?;
    Ok(ApiResponse::ok(SpaceData { space }))
}

async fn delete_space(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<crate::server::response::Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::DeleteSpace,
        Target::Space(&id),
    )?;

    state.store.delete_space(&id)?;

    // Stored bytes go with the metadata; best effort.
    let dir = state.files_dir.join(&id);
    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(&dir) {
            tracing::warn!(space_id = %id, "failed to remove space files: {e}");
        }
    }
    Ok(ok_empty())
}
