use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::idp::IdpIdentity;

struct CacheEntry {
    identity: IdpIdentity,
    expires_at: Instant,
    refreshed_at: Instant,
}

/// Process-wide positive cache of token validations. Lookups that find an
/// entry due for a TTL refresh mark it refreshed immediately so only one
/// request spawns the refresh task.
pub struct PrincipalCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    refresh_every: Duration,
}

impl PrincipalCache {
    #[must_use]
    pub fn new(ttl: Duration, refresh_every: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            refresh_every,
        }
    }

    /// Returns the cached identity and whether a TTL refresh is now due.
    pub fn get(&self, token: &str) -> Option<(IdpIdentity, bool)> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let entry = entries.get_mut(token)?;
        if entry.expires_at <= now {
            entries.remove(token);
            return None;
        }

        let refresh_due = now.duration_since(entry.refreshed_at) >= self.refresh_every;
        if refresh_due {
            entry.refreshed_at = now;
        }
        Some((entry.identity.clone(), refresh_due))
    }

    pub fn insert(&self, token: &str, identity: IdpIdentity) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            token.to_string(),
            CacheEntry {
                identity,
                expires_at: now + self.ttl,
                refreshed_at: now,
            },
        );
    }

    pub fn evict(&self, token: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(token);
    }
}
