use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Serialize;

use crate::acl;
use crate::auth::RequireAuth;
use crate::authz::{Action, Target, authorize};
use crate::server::AppState;
use crate::server::dto::{AclParams, CapabilityMap, RoleParams};
use crate::server::response::{ApiError, ApiResponse, Empty, ok_empty, require};
use crate::types::{GlobalAclRow, GlobalCapability, SpaceAclRow, SpaceCapability};

pub fn acl_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/global_acl", get(get_global).post(set_global))
        .route("/global_acl/all", get(get_global_all))
        .route("/space_acl", get(get_space).post(set_space))
        .route("/space_acl/all", get(get_space_all))
}

/// Wire shape of one ACL row: the full name → granted map, every capability
/// in the closed set present.
#[derive(Serialize)]
struct AclRowData {
    role: String,
    capabilities: BTreeMap<&'static str, bool>,
}

#[derive(Serialize)]
struct AclData {
    acl: AclRowData,
}

#[derive(Serialize)]
struct AclListData {
    acl: Vec<AclRowData>,
}

fn global_row_data(row: GlobalAclRow) -> AclRowData {
    AclRowData {
        role: row.role,
        capabilities: row.caps.to_pairs().into_iter().collect(),
    }
}

fn space_row_data(row: SpaceAclRow) -> AclRowData {
    AclRowData {
        role: row.role,
        capabilities: row.caps.to_pairs().into_iter().collect(),
    }
}

fn pairs(map: &CapabilityMap) -> Vec<(&str, bool)> {
    map.iter().map(|(k, v)| (k.as_str(), *v)).collect()
}

/// Any authenticated user may read a global ACL row; their own role's row
/// by default.
async fn get_global(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoleParams>,
) -> Result<Json<ApiResponse<AclData>>, ApiError> {
    let role = params.role.unwrap_or_else(|| principal.global_role.clone());
    let row = acl::global::get(state.store.as_ref(), &role)?.unwrap_or(GlobalAclRow {
        role,
        caps: GlobalCapability::default(),
    });
    Ok(ApiResponse::ok(AclData {
        acl: global_row_data(row),
    }))
}

async fn get_global_all(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<AclListData>>, ApiError> {
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewRoles,
        Target::Global,
    )?;
    let rows = acl::global::get_all(state.store.as_ref())?;
    Ok(ApiResponse::ok(AclListData {
        acl: rows.into_iter().map(global_row_data).collect(),
    }))
}

async fn set_global(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoleParams>,
    Json(body): Json<CapabilityMap>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::UpdateGlobalAcl,
        Target::Global,
    )?;
    let role = require(params.role, "role")?;
    let caps = GlobalCapability::from_pairs(pairs(&body))
        .ok_or_else(|| ApiError::bad_request("invalid_capability"))?;

    acl::global::set_all(state.store.as_ref(), &GlobalAclRow { role, caps })?;
    Ok(ok_empty())
}

async fn get_space(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<AclParams>,
) -> Result<Json<ApiResponse<AclData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewSpace,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let role = params.role.unwrap_or_else(|| principal.global_role.clone());
    let row = acl::space::get(state.store.as_ref(), &role, &space.id)?.unwrap_or(SpaceAclRow {
        role,
        space_id: space.id,
        caps: SpaceCapability::default(),
    });
    Ok(ApiResponse::ok(AclData {
        acl: space_row_data(row),
    }))
}

async fn get_space_all(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<AclParams>,
) -> Result<Json<ApiResponse<AclListData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewSpaceInternals,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let rows = acl::space::get_all(state.store.as_ref(), &space.id)?;
    Ok(ApiResponse::ok(AclListData {
        acl: rows.into_iter().map(space_row_data).collect(),
    }))
}

async fn set_space(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<AclParams>,
    Json(body): Json<CapabilityMap>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let role = require(params.role, "role")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::UpdateSpaceAcl,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let caps = SpaceCapability::from_pairs(pairs(&body))
        .ok_or_else(|| ApiError::bad_request("invalid_capability"))?;

    acl::space::set_all(
        state.store.as_ref(),
        &SpaceAclRow {
            role,
            space_id: space.id,
            caps,
        },
    )?;
    Ok(ok_empty())
}
