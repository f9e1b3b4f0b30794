use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Serialize;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::SearchParams;
use crate::server::response::{ApiError, ApiResponse, require};
use crate::types::Post;

const DEFAULT_SEARCH_COUNT: i64 = 50;

pub fn search_router() -> Router<Arc<AppState>> {
    Router::new().route("/search", get(search))
}

#[derive(Serialize)]
struct SearchData {
    posts: Vec<Post>,
}

/// Pre-filter search: the candidate set is narrowed to visible posts
/// (own + followed authors, member spaces) before the text match runs, so
/// no post the caller could not read is ever scanned.
async fn search(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let query = require(params.query, "query")?;
    if query.trim().is_empty() {
        return Err(ApiError::missing_key("query"));
    }

    let mut authors = state.store.list_follows(&principal.username)?;
    authors.push(principal.username.clone());

    let member_spaces: Vec<String> = state
        .store
        .list_spaces()?
        .into_iter()
        .filter(|s| s.is_member(&principal.username))
        .map(|s| s.id)
        .collect();

    let count = params.count.unwrap_or(DEFAULT_SEARCH_COUNT);
    let posts = state
        .store
        .search_posts(query.trim(), &authors, &member_spaces, count)?;
    Ok(ApiResponse::ok(SearchData { posts }))
}
