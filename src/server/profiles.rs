use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::auth::RequireAuth;
use crate::error::DenyReason;
use crate::server::AppState;
use crate::server::dto::{ProfileBody, UserParams};
use crate::server::response::{ApiError, ApiResponse, ok_empty, require};
use crate::types::{Notification, Profile};

pub fn profiles_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profileinformation", get(get_profile).post(update_profile))
        .route("/follow", post(follow).delete(unfollow).get(list_follows))
        .route("/notifications", get(notifications))
}

#[derive(Serialize)]
struct ProfileData {
    profile: Profile,
}

#[derive(Serialize)]
struct FollowsData {
    follows: Vec<String>,
}

#[derive(Serialize)]
struct NotificationsData {
    notifications: Vec<Notification>,
}

async fn get_profile(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<ApiResponse<ProfileData>>, ApiError> {
    let username = params.user.unwrap_or_else(|| principal.username.clone());
    let profile = state
        .store
        .get_profile(&username)?
        .ok_or(crate::error::Error::Denied(DenyReason::UserDoesntExist))?;
    Ok(ApiResponse::ok(ProfileData { profile }))
}

/// Updates the caller's own profile. The role field is read-only here; it
/// only moves through the role endpoints.
async fn update_profile(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProfileBody>,
) -> Result<Json<ApiResponse<ProfileData>>, ApiError> {
    let mut profile = state.store.ensure_profile(&principal.username)?;
    if body.bio.is_some() {
        profile.bio = body.bio;
    }
    if body.picture.is_some() {
        profile.picture = body.picture;
    }
    state.store.update_profile(&profile)?;
    Ok(ApiResponse::ok(ProfileData { profile }))
}

async fn follow(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Response, ApiError> {
    let target = require(params.user, "user")?;
    if state.store.get_profile(&target)?.is_none() {
        return Err(crate::error::Error::Denied(DenyReason::UserDoesntExist).into());
    }

    if state.store.add_follow(&principal.username, &target)? {
        Ok(ok_empty().into_response())
    } else {
        Ok(StatusCode::NOT_MODIFIED.into_response())
    }
}

async fn unfollow(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Response, ApiError> {
    let target = require(params.user, "user")?;
    if state.store.remove_follow(&principal.username, &target)? {
        Ok(ok_empty().into_response())
    } else {
        Ok(StatusCode::NOT_MODIFIED.into_response())
    }
}

async fn list_follows(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<FollowsData>>, ApiError> {
    let follows = state.store.list_follows(&principal.username)?;
    Ok(ApiResponse::ok(FollowsData { follows }))
}

async fn notifications(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<NotificationsData>>, ApiError> {
    let notifications = state.store.list_notifications(&principal.username)?;
    Ok(ApiResponse::ok(NotificationsData { notifications }))
}
