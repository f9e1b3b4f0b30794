use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Serialize;

use crate::auth::RequireAuth;
use crate::authz::{Action, Target, authorize};
use crate::roles;
use crate::server::AppState;
use crate::server::dto::RoleParams;
use crate::server::response::{ApiError, ApiResponse, Empty, ok_empty, require};

pub fn roles_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(list))
        .route("/user", get(user_role).post(set_user_role))
        .route("/exists", get(exists))
}

#[derive(Serialize)]
struct RolesData {
    roles: Vec<String>,
}

#[derive(Serialize)]
struct RoleData {
    user: String,
    role: String,
}

#[derive(Serialize)]
struct ExistsData {
    exists: bool,
}

async fn list(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RolesData>>, ApiError> {
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewRoles,
        Target::Global,
    )?;
    let roles = roles::distinct_roles(state.store.as_ref())?;
    Ok(ApiResponse::ok(RolesData { roles }))
}

async fn user_role(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoleParams>,
) -> Result<Json<ApiResponse<RoleData>>, ApiError> {
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewRoles,
        Target::Global,
    )?;
    let user = require(params.user, "user")?;
    let role = roles::role_of(state.store.as_ref(), &user)?;
    Ok(ApiResponse::ok(RoleData { user, role }))
}

async fn set_user_role(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoleParams>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::SetRole,
        Target::Global,
    )?;
    let user = require(params.user, "user")?;
    let role = require(params.role, "role")?;
    if role.trim().is_empty() {
        return Err(ApiError::bad_request("invalid_role"));
    }

    roles::set_role(state.store.as_ref(), &user, role.trim())?;
    Ok(ok_empty())
}

async fn exists(
    RequireAuth(_principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoleParams>,
) -> Result<Json<ApiResponse<ExistsData>>, ApiError> {
    let role = require(params.role, "role")?;
    let exists = roles::role_exists(state.store.as_ref(), &role)?;
    Ok(ApiResponse::ok(ExistsData { exists }))
}
