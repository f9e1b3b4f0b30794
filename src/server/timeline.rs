use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::authz::{Action, Target, authorize};
use crate::error::DenyReason;
use crate::server::AppState;
use crate::server::dto::{CommentParams, PostBody, TimelineParams};
use crate::server::response::{ApiError, ApiResponse, require};
use crate::server::validation::validate_text;
use crate::types::{Comment, Post};

const DEFAULT_TIMELINE_COUNT: i64 = 50;

pub fn timeline_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/space", get(space_timeline))
        .route("/user", get(user_timeline))
        .route("/all", get(full_timeline))
        .route("/post", post(create_post))
        .route("/comment", post(create_comment))
        .route("/comments", get(list_comments))
}

#[derive(Serialize)]
struct PostsData {
    posts: Vec<Post>,
}

#[derive(Serialize)]
struct PostData {
    post: Post,
}

#[derive(Serialize)]
struct CommentData {
    comment: Comment,
}

#[derive(Serialize)]
struct CommentsData {
    comments: Vec<Comment>,
}

async fn space_timeline(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<ApiResponse<PostsData>>, ApiError> {
    let id = require(params.id, "id")?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ReadTimeline,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let count = params.count.unwrap_or(DEFAULT_TIMELINE_COUNT);
    let posts = state.store.list_space_posts(&space.id, count)?;
    Ok(ApiResponse::ok(PostsData { posts }))
}

/// Own posts plus posts by followed authors, restricted to spaces the
/// caller is a member of.
async fn user_timeline(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<ApiResponse<PostsData>>, ApiError> {
    let mut authors = state.store.list_follows(&principal.username)?;
    authors.push(principal.username.clone());

    let member_spaces: Vec<String> = state
        .store
        .list_spaces()?
        .into_iter()
        .filter(|s| s.is_member(&principal.username))
        .map(|s| s.id)
        .collect();

    let count = params.count.unwrap_or(DEFAULT_TIMELINE_COUNT);
    let posts = state
        .store
        .list_posts_by_authors(&authors, &member_spaces, count)?;
    Ok(ApiResponse::ok(PostsData { posts }))
}

async fn full_timeline(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<ApiResponse<PostsData>>, ApiError> {
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewFullTimeline,
        Target::Global,
    )?;

    let count = params.count.unwrap_or(DEFAULT_TIMELINE_COUNT);
    let posts = state.store.list_all_posts(count)?;
    Ok(ApiResponse::ok(PostsData { posts }))
}

async fn create_post(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimelineParams>,
    Json(body): Json<PostBody>,
) -> Result<Json<ApiResponse<PostData>>, ApiError> {
    let id = require(params.id, "id")?;
    validate_text(&body.text)?;
    let space = authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::CreatePost,
        Target::Space(&id),
    )?
    .ok_or_else(ApiError::internal)?;

    let post = Post {
        id: Uuid::new_v4().to_string(),
        space_id: space.id,
        author: principal.username,
        text: body.text,
        created_at: Utc::now(),
    };
    state.store.create_post(&post)?;
    Ok(ApiResponse::ok(PostData { post }))
}

async fn create_comment(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<CommentParams>,
    Json(body): Json<PostBody>,
) -> Result<Json<ApiResponse<CommentData>>, ApiError> {
    let post_id = require(params.post_id, "post_id")?;
    validate_text(&body.text)?;

    let post = state
        .store
        .get_post(&post_id)?
        .ok_or(crate::error::Error::Denied(DenyReason::PostDoesntExist))?;

    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::CreateComment,
        Target::Space(&post.space_id),
    )?;

    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        post_id: post.id,
        author: principal.username,
        text: body.text,
        created_at: Utc::now(),
    };
    state.store.create_comment(&comment)?;
    Ok(ApiResponse::ok(CommentData { comment }))
}

async fn list_comments(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<CommentParams>,
) -> Result<Json<ApiResponse<CommentsData>>, ApiError> {
    let post_id = require(params.post_id, "post_id")?;

    let post = state
        .store
        .get_post(&post_id)?
        .ok_or(crate::error::Error::Denied(DenyReason::PostDoesntExist))?;

    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ReadTimeline,
        Target::Space(&post.space_id),
    )?;

    let comments = state.store.list_post_comments(&post.id)?;
    Ok(ApiResponse::ok(CommentsData { comments }))
}
