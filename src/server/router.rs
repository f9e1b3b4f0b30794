use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::acl::acl_router;
use super::files::files_router;
use super::profiles::profiles_router;
use super::reports::reports_router;
use super::roles::roles_router;
use super::search::search_router;
use super::spaces::spaces_router;
use super::timeline::timeline_router;
use crate::auth::PrincipalResolver;
use crate::notify::{InviteRateLimiter, Notifier};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub resolver: Arc<PrincipalResolver>,
    pub notifier: Notifier,
    pub invites: InviteRateLimiter,
    pub files_dir: PathBuf,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/spaceadministration", spaces_router())
        .merge(files_router())
        .nest("/timeline", timeline_router())
        .merge(search_router())
        .merge(profiles_router())
        .nest("/role", roles_router())
        .merge(acl_router())
        .merge(reports_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
