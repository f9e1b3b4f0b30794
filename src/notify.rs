//! Notification fan-out: a bounded queue feeding a small worker pool.
//! Enqueueing never blocks the request path and a delivery failure never
//! affects the state transition that produced the event.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::store::Store;
use crate::types::{Notification, NotificationKind};

/// A pending notification for a single recipient. Multi-recipient fan-out
/// (a join request notifying every space admin) is one event per recipient,
/// so per-recipient failures stay isolated.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub actor: String,
    pub recipient: String,
    pub space_id: String,
    pub space_name: String,
}

#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<NotificationEvent>,
}

impl Notifier {
    /// Starts `workers` delivery tasks over a queue of `capacity` events.
    pub fn spawn(
        store: Arc<dyn Store>,
        sink_url: Option<String>,
        workers: usize,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let client = reqwest::Client::new();

        for _ in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let store = Arc::clone(&store);
            let sink_url = sink_url.clone();
            let client = client.clone();
            tokio::spawn(async move {
                loop {
                    let event = rx.lock().await.recv().await;
                    let Some(event) = event else { break };
                    deliver(store.as_ref(), sink_url.as_deref(), &client, event).await;
                }
            });
        }

        Self { tx }
    }

    /// Non-blocking enqueue. When the queue is full the event is dropped
    /// with a warning; notifications are best-effort.
    pub fn enqueue(&self, events: Vec<NotificationEvent>) {
        for event in events {
            if let Err(e) = self.tx.try_send(event) {
                tracing::warn!("dropping notification: {e}");
            }
        }
    }
}

async fn deliver(
    store: &dyn Store,
    sink_url: Option<&str>,
    client: &reqwest::Client,
    event: NotificationEvent,
) {
    let notification = Notification {
        id: Uuid::new_v4().to_string(),
        kind: event.kind,
        actor: event.actor,
        recipient: event.recipient,
        space_id: event.space_id,
        space_name: event.space_name,
        created_at: Utc::now(),
    };

    if let Err(e) = store.insert_notification(&notification) {
        tracing::warn!(
            recipient = %notification.recipient,
            "failed to persist notification: {e}"
        );
    }

    if let Some(url) = sink_url {
        let result = client.post(url).json(&notification).send().await;
        match result {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(
                    recipient = %notification.recipient,
                    status = %resp.status(),
                    "notification sink rejected event"
                );
            }
            Err(e) => {
                tracing::warn!(
                    recipient = %notification.recipient,
                    "notification sink unreachable: {e}"
                );
            }
            Ok(_) => {}
        }
    }
}

/// Per-actor cap on invitation notifications. A limit of 0 disables the
/// check. Counts are per process; this is the configurable hook, not a
/// durable quota.
pub struct InviteRateLimiter {
    limit: u32,
    counts: Mutex<HashMap<String, u32>>,
}

impl InviteRateLimiter {
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// Records one invitation by `actor` and reports whether its
    /// notification should still be delivered.
    pub fn allow(&self, actor: &str) -> bool {
        if self.limit == 0 {
            return true;
        }
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let count = counts.entry(actor.to_string()).or_insert(0);
        *count += 1;
        *count <= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    #[tokio::test]
    async fn test_enqueue_delivers_to_store() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.initialize().unwrap();
        store
            .create_space(&crate::types::Space {
                id: "s1".into(),
                name: "general".into(),
                invisible: false,
                joinable: true,
                description: None,
                picture: None,
                members: vec![],
                admins: vec![],
                invites: vec![],
                requests: vec![],
                files: vec![],
                created_at: Utc::now(),
            })
            .unwrap();

        let notifier = Notifier::spawn(store.clone(), None, 2, 16);
        notifier.enqueue(vec![NotificationEvent {
            kind: NotificationKind::Invite,
            actor: "alice".into(),
            recipient: "bob".into(),
            space_id: "s1".into(),
            space_name: "general".into(),
        }]);

        // Delivery is async; poll briefly.
        for _ in 0..50 {
            if !store.list_notifications("bob").unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let delivered = store.list_notifications("bob").unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].kind, NotificationKind::Invite);
        assert_eq!(delivered[0].actor, "alice");
    }

    #[test]
    fn test_rate_limiter() {
        let limiter = InviteRateLimiter::new(2);
        assert!(limiter.allow("alice"));
        assert!(limiter.allow("alice"));
        assert!(!limiter.allow("alice"));
        assert!(limiter.allow("bob"));

        let unlimited = InviteRateLimiter::new(0);
        for _ in 0..100 {
            assert!(unlimited.allow("alice"));
        }
    }
}
