use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identity fields the IdP vouches for. The global role is not part of
/// this: the role registry owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdpIdentity {
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The external identity provider. Implemented over HTTP in production and
/// by a fixture in the test suites.
#[async_trait]
pub trait IdpClient: Send + Sync {
    /// Exchanges an opaque bearer token for an identity. `None` means the
    /// token is unknown or expired.
    async fn token_validation(&self, token: &str) -> Result<Option<IdpIdentity>>;

    /// Extends the token's lifetime at the IdP. `false` means the IdP
    /// reports the token invalidated; callers must evict it.
    async fn update_token_ttl(&self, token: &str) -> Result<bool>;
}

// TTL refreshes must never stall a request; one attempt, short deadline.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct ValidationResponse {
    valid: bool,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

pub struct HttpIdp {
    base_url: String,
    client: reqwest::Client,
}

impl HttpIdp {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdpClient for HttpIdp {
    async fn token_validation(&self, token: &str) -> Result<Option<IdpIdentity>> {
        let response = self
            .client
            .post(format!("{}/token_validation", self.base_url))
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| Error::IdpUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::IdpUnreachable(format!(
                "token_validation returned {}",
                response.status()
            )));
        }

        let body: ValidationResponse = response
            .json()
            .await
            .map_err(|e| Error::IdpUnreachable(e.to_string()))?;

        if !body.valid {
            return Ok(None);
        }
        match (body.user_id, body.username) {
            (Some(user_id), Some(username)) => Ok(Some(IdpIdentity {
                user_id,
                username,
                email: body.email,
            })),
            _ => Err(Error::IdpUnreachable(
                "token_validation response missing identity fields".to_string(),
            )),
        }
    }

    async fn update_token_ttl(&self, token: &str) -> Result<bool> {
        let response = self
            .client
            .post(format!("{}/update_token_ttl", self.base_url))
            .timeout(REFRESH_TIMEOUT)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| Error::IdpUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::IdpUnreachable(format!(
                "update_token_ttl returned {}",
                response.status()
            )));
        }

        #[derive(Deserialize)]
        struct TtlResponse {
            valid: bool,
        }
        let body: TtlResponse = response
            .json()
            .await
            .map_err(|e| Error::IdpUnreachable(e.to_string()))?;
        Ok(body.valid)
    }
}
