use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::authz::{Action, Target, authorize};
use crate::error::DenyReason;
use crate::server::AppState;
use crate::server::dto::{FileParams, SpaceParams};
use crate::server::response::{ApiError, ApiResponse, Empty, ok_empty, require};
use crate::server::validation::validate_filename;
use crate::types::{FileRef, Space};

const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

pub fn files_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/spaceadministration/files", get(list))
        .route("/spaceadministration/files/upload", post(upload))
        .route("/spaceadministration/files/download", get(download))
        .route("/spaceadministration/files/delete", delete(delete_file))
}

#[derive(Serialize)]
struct FilesData {
    files: Vec<FileRef>,
}

#[derive(Serialize)]
struct FileData {
    file: FileRef,
}

async fn list(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
) -> Result<Json<ApiResponse<FilesData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ReadFiles,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    Ok(ApiResponse::ok(FilesData { files: space.files }))
}

async fn upload(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceParams>,
    mut multipart: axum::extract::Multipart,
) -> Result<Json<ApiResponse<FileData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::WriteFiles,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let (filename, content_type, content) = parse_upload(&mut multipart).await?;
    validate_filename(&filename)?;

    let file = FileRef {
        file_id: Uuid::new_v4().to_string(),
        space_id: space.id.clone(),
        filename,
        content_type,
        author: principal.username.clone(),
        belongs_to_post: false,
        created_at: Utc::now(),
    };

    let dir = state.files_dir.join(&space.id);
    std::fs::create_dir_all(&dir).map_err(|_| ApiError::internal())?;
    std::fs::write(dir.join(&file.file_id), &content).map_err(|_| ApiError::internal())?;

    state.store.add_space_file(&file)?;
    Ok(ApiResponse::ok(FileData { file }))
}

async fn parse_upload(
    multipart: &mut axum::extract::Multipart,
) -> Result<(String, String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("invalid_multipart"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::missing_key("filename"))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::bad_request("invalid_multipart"))?;
        if data.len() > MAX_UPLOAD_SIZE {
            return Err(ApiError::bad_request("file_too_large"));
        }
        return Ok((filename, content_type, data.to_vec()));
    }
    Err(ApiError::missing_key("file"))
}

async fn download(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<FileParams>,
) -> Result<Response, ApiError> {
    let id = require(params.id, "id")?;
    let file_id = require(params.file_id, "file_id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ReadFiles,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let file = load_file(&state, &space, &file_id)?;
    let bytes = std::fs::read(state.files_dir.join(&space.id).join(&file.file_id))
        .map_err(|_| ApiError::not_found(DenyReason::FileDoesntExist.as_str()))?;

    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(bytes),
    )
        .into_response())
}

async fn delete_file(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<FileParams>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let id = require(params.id, "id")?;
    let file_id = require(params.file_id, "file_id")?;

    // Authors delete their own uploads; anything else is an admin action.
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::WriteFiles,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let file = load_file(&state, &space, &file_id)?;
    if file.author != principal.username {
        authorize(
            state.store.as_ref(),
            Some(&principal),
            Action::DeleteOtherFile,
            Target::Space(&id),
        )?;
    }

    // Post attachments go away with their post, never directly.
    if file.belongs_to_post {
        return Err(crate::error::Error::Denied(DenyReason::FileBelongsToPost).into());
    }

    state.store.remove_space_file(&space.id, &file.file_id)?;
    if let Err(e) = std::fs::remove_file(state.files_dir.join(&space.id).join(&file.file_id)) {
        tracing::warn!(file_id = %file.file_id, "failed to remove file bytes: {e}");
    }
    Ok(ok_empty())
}

fn load_file(state: &AppState, space: &Space, file_id: &str) -> Result<FileRef, ApiError> {
    state
        .store
        .get_space_file(&space.id, file_id)?
        .ok_or_else(|| {
            ApiError {
                status: axum::http::StatusCode::CONFLICT,
                reason: DenyReason::FileDoesntExist.as_str().to_string(),
            }
        })
}
