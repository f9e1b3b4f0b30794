use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::error::Error;

/// Standard success envelope: `{"success": true, ...payload}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Payload for operations that report nothing beyond success.
#[derive(Debug, Serialize)]
pub struct Empty {}

#[must_use]
pub fn ok_empty() -> Json<ApiResponse<Empty>> {
    ApiResponse::ok(Empty {})
}

/// API error carrying the machine-readable reason string.
pub struct ApiError {
    pub status: StatusCode,
    pub reason: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn missing_key(key: &str) -> Self {
        Self::bad_request(format!("missing_key:{key}"))
    }

    #[must_use]
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            reason: "internal_error".to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::Denied(reason) => Self {
                status: StatusCode::from_u16(reason.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                reason: reason.as_str().to_string(),
            },
            Error::NotFound => Self::not_found("not_found"),
            Error::InvalidCapability(name) => {
                Self::bad_request(format!("invalid_capability:{name}"))
            }
            other => {
                tracing::error!("request failed: {other}");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "reason": self.reason });
        (self.status, Json(body)).into_response()
    }
}

/// Pulls a required query parameter, answering `missing_key:<key>` when the
/// client left it out.
pub fn require<T>(value: Option<T>, key: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::missing_key(key))
}
