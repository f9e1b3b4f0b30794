use std::sync::Arc;
use std::time::Duration;

use super::cache::PrincipalCache;
use super::idp::{IdpClient, IdpIdentity};
use crate::error::Result;

/// Resolves bearer tokens to identities, caching positive validations and
/// refreshing token TTLs at the IdP in the background.
pub struct PrincipalResolver {
    idp: Arc<dyn IdpClient>,
    cache: Arc<PrincipalCache>,
}

impl PrincipalResolver {
    #[must_use]
    pub fn new(idp: Arc<dyn IdpClient>, cache_ttl: Duration, refresh_every: Duration) -> Self {
        Self {
            idp,
            cache: Arc::new(PrincipalCache::new(cache_ttl, refresh_every)),
        }
    }

    /// Returns the identity for a token, or `None` for an unknown token.
    /// On a cache hit with a due refresh, the TTL update runs as a
    /// fire-and-forget task; if the IdP reports the token invalidated the
    /// cache entry is evicted and the next request re-resolves.
    pub async fn resolve(&self, token: &str) -> Result<Option<IdpIdentity>> {
        if let Some((identity, refresh_due)) = self.cache.get(token) {
            if refresh_due {
                let idp = Arc::clone(&self.idp);
                let cache = Arc::clone(&self.cache);
                let token = token.to_string();
                tokio::spawn(async move {
                    match idp.update_token_ttl(&token).await {
                        Ok(true) => {}
                        Ok(false) => {
                            tracing::info!("token invalidated by IdP, evicting");
                            cache.evict(&token);
                        }
                        Err(e) => tracing::warn!("token TTL refresh failed: {e}"),
                    }
                });
            }
            return Ok(Some(identity));
        }

        match self.idp.token_validation(token).await? {
            Some(identity) => {
                self.cache.insert(token, identity.clone());
                Ok(Some(identity))
            }
            None => Ok(None),
        }
    }
}
