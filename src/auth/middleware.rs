use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::server::AppState;
use crate::types::Principal;

/// Extractor that requires a valid bearer token. Resolves the token
/// through the principal cache and attaches the registry role, creating
/// the profile on first sight.
pub struct RequireAuth(pub Principal);

#[derive(Debug)]
pub enum AuthError {
    NoLoggedInUser,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            AuthError::NoLoggedInUser => (StatusCode::UNAUTHORIZED, "no_logged_in_user"),
            AuthError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = json!({ "success": false, "reason": reason });
        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                "Bearer realm=\"huddle\"".parse().unwrap(),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::NoLoggedInUser)?;

        let identity = state
            .resolver
            .resolve(&token)
            .await
            .map_err(|e| {
                tracing::error!("token resolution failed: {e}");
                AuthError::InternalError
            })?
            .ok_or(AuthError::NoLoggedInUser)?;

        let profile = state
            .store
            .ensure_profile(&identity.username)
            .map_err(|e| {
                tracing::error!("profile lookup failed: {e}");
                AuthError::InternalError
            })?;

        Ok(RequireAuth(Principal {
            user_id: identity.user_id,
            username: identity.username,
            email: identity.email,
            global_role: profile.role,
        }))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
