//! Connection registry
//!
//! Maps a user identity to the live connections opened by that user and
//! fans events out to them.
//!
//! # Design
//!
//! Each connection owns a bounded queue of serialized frames. The registry
//! keeps the only sender for that queue, so removing a handle from the
//! registry also closes the queue and ends the owning session. A bucket
//! exists only while it holds at least one handle.
//!
//! The lock is never held across an await: `broadcast` copies the bucket,
//! releases the lock, then enqueues to every handle concurrently with a
//! per-handle timeout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use super::events::OutboundEvent;

/// Process-unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Sending half of one connection's outbound queue
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<String>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

/// user identity -> live connections, in registration order
pub struct ConnectionRegistry {
    buckets: Mutex<HashMap<String, Vec<ConnectionHandle>>>,
    next_id: AtomicU64,
    send_timeout: Duration,
}

impl ConnectionRegistry {
    pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(send_timeout: Duration) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            send_timeout,
        }
    }

    /// Create a handle and the receiver its session drains.
    /// The handle is not registered yet.
    pub fn open_connection(&self, capacity: usize) -> (ConnectionHandle, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        (ConnectionHandle { id, sender }, receiver)
    }

    /// Append a handle to the user's bucket, creating it if needed
    pub fn register(&self, user_id: &str, handle: ConnectionHandle) {
        let mut buckets = self.buckets.lock();
        buckets.entry(user_id.to_string()).or_default().push(handle);
    }

    /// Remove a handle; drops the bucket when it becomes empty.
    /// Unknown users or handles are a no-op. Returns true if something was removed.
    pub fn unregister(&self, user_id: &str, id: ConnectionId) -> bool {
        self.remove_many(user_id, &[id]) > 0
    }

    fn remove_many(&self, user_id: &str, ids: &[ConnectionId]) -> usize {
        let mut buckets = self.buckets.lock();
        let Some(bucket) = buckets.get_mut(user_id) else {
            return 0;
        };

        let before = bucket.len();
        bucket.retain(|h| !ids.contains(&h.id));
        let removed = before - bucket.len();

        if bucket.is_empty() {
            buckets.remove(user_id);
        }
        removed
    }

    /// Send `{type, payload}` to every connection of `user_id`
    ///
    /// Best effort: a handle whose queue is closed or stays full past the
    /// send timeout is evicted and the others still receive the event.
    /// Returns how many handles accepted the event.
    pub async fn broadcast<P>(&self, user_id: &str, event_type: &str, payload: &P) -> usize
    where
        P: Serialize + ?Sized,
    {
        let text = match OutboundEvent::new(event_type, payload).to_text() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(user_id, event_type, error = %e, "Failed to serialize event");
                return 0;
            }
        };
        self.broadcast_text(user_id, event_type, text).await
    }

    async fn broadcast_text(&self, user_id: &str, event_type: &str, text: String) -> usize {
        let handles: Vec<ConnectionHandle> = match self.buckets.lock().get(user_id) {
            Some(bucket) => bucket.clone(),
            None => return 0,
        };

        let timeout = self.send_timeout;
        let attempts = handles.iter().map(|handle| {
            let text = text.clone();
            async move {
                match handle.sender.send_timeout(text, timeout).await {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::warn!(
                            user_id,
                            event_type,
                            connection = %handle.id,
                            error = %e,
                            "Delivery failed, evicting connection"
                        );
                        Some(handle.id)
                    }
                }
            }
        });

        let failed: Vec<ConnectionId> = join_all(attempts).await.into_iter().flatten().collect();
        if !failed.is_empty() {
            self.remove_many(user_id, &failed);
        }

        handles.len() - failed.len()
    }

    /// Live connections for one user
    pub fn connection_count(&self, user_id: &str) -> usize {
        self.buckets.lock().get(user_id).map_or(0, Vec::len)
    }

    pub fn is_registered(&self, user_id: &str, id: ConnectionId) -> bool {
        self.buckets
            .lock()
            .get(user_id)
            .is_some_and(|bucket| bucket.iter().any(|h| h.id == id))
    }

    /// Users with at least one live connection
    pub fn user_count(&self) -> usize {
        self.buckets.lock().len()
    }

    pub fn total_connections(&self) -> usize {
        self.buckets.lock().values().map(Vec::len).sum()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEND_TIMEOUT)
    }
}
