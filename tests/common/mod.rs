use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use huddle::acl;
use huddle::auth::{IdpClient, IdpIdentity, PrincipalResolver};
use huddle::error::Result;
use huddle::notify::{InviteRateLimiter, Notifier};
use huddle::server::{AppState, create_router};
use huddle::store::{SqliteStore, Store};
use huddle::types::{GlobalAclRow, GlobalCapability};

/// IdP fixture: a fixed token → identity table.
pub struct StubIdp {
    identities: HashMap<String, IdpIdentity>,
}

#[async_trait]
impl IdpClient for StubIdp {
    async fn token_validation(&self, token: &str) -> Result<Option<IdpIdentity>> {
        Ok(self.identities.get(token).cloned())
    }

    async fn update_token_ttl(&self, _token: &str) -> Result<bool> {
        Ok(true)
    }
}

pub struct TestServer {
    pub router: Router,
    pub store: Arc<SqliteStore>,
    _tmp: tempfile::TempDir,
}

/// Users known to the stub IdP; authenticate as `tok-<name>`.
pub const USERS: &[&str] = &["root", "alice", "bob", "carol"];

pub fn token(user: &str) -> String {
    format!("tok-{user}")
}

impl TestServer {
    /// Fresh server with "root" as global admin, everyone else on the
    /// "user" role, and `create_space` granted to "user".
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::new(tmp.path().join("huddle.db")).unwrap());
        store.initialize().unwrap();

        acl::global::insert_admin(store.as_ref()).unwrap();
        acl::global::insert_default(store.as_ref(), "guest").unwrap();
        store
            .upsert_global_acl(&GlobalAclRow {
                role: "user".into(),
                caps: GlobalCapability::CREATE_SPACE,
            })
            .unwrap();

        let mut identities = HashMap::new();
        for user in USERS {
            store.ensure_profile(user).unwrap();
            let role = if *user == "root" { "admin" } else { "user" };
            store.set_role(user, role).unwrap();
            identities.insert(
                token(user),
                IdpIdentity {
                    user_id: format!("id-{user}"),
                    username: (*user).to_string(),
                    email: None,
                },
            );
        }

        let resolver = Arc::new(PrincipalResolver::new(
            Arc::new(StubIdp { identities }),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        ));
        let notifier = Notifier::spawn(store.clone(), None, 1, 64);

        let state = Arc::new(AppState {
            store: store.clone(),
            resolver,
            notifier,
            invites: InviteRateLimiter::new(0),
            files_dir: tmp.path().join("files"),
        });

        Self {
            router: create_router(state),
            store,
            _tmp: tmp,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        user: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, path: &str, user: &str) -> (StatusCode, serde_json::Value) {
        self.request("GET", path, Some(user), None).await
    }

    pub async fn post(&self, path: &str, user: &str) -> (StatusCode, serde_json::Value) {
        self.request("POST", path, Some(user), None).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        user: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.request("POST", path, Some(user), Some(body)).await
    }

    pub async fn delete(&self, path: &str, user: &str) -> (StatusCode, serde_json::Value) {
        self.request("DELETE", path, Some(user), None).await
    }

    /// Creates a space as `user` and returns its id.
    pub async fn create_space(&self, user: &str, name: &str) -> String {
        let (status, body) = self
            .post(&format!("/spaceadministration/create?name={name}"), user)
            .await;
        assert_eq!(status, StatusCode::OK, "create space failed: {body}");
        body["space"]["id"].as_str().unwrap().to_string()
    }
}
