//! Entry change notifications
//!
//! Called by the write path after the store has committed a change. These
//! never fail: users without an open connection simply miss the event.

use std::sync::Arc;

use serde::Serialize;

use super::events::{event_type, EntryDeletedPayload};
use super::registry::ConnectionRegistry;

/// Event emitters handed to the CRUD layer
#[derive(Clone)]
pub struct Notifier {
    registry: Arc<ConnectionRegistry>,
}

impl Notifier {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Broadcast `new_expense` with the entry as payload
    pub async fn entry_created<T>(&self, user_id: &str, entry: &T) -> usize
    where
        T: Serialize + Sync + ?Sized,
    {
        self.registry
            .broadcast(user_id, event_type::NEW_EXPENSE, entry)
            .await
    }

    /// Broadcast `expense_{action}` with the entry as payload
    pub async fn entry_changed<T>(&self, user_id: &str, entry: &T, action: &str) -> usize
    where
        T: Serialize + Sync + ?Sized,
    {
        self.registry
            .broadcast(user_id, &event_type::expense_action(action), entry)
            .await
    }

    /// Broadcast `expense_deleted` with `{expense_id}`
    pub async fn entry_deleted(&self, user_id: &str, entry_id: &str) -> usize {
        let payload = EntryDeletedPayload {
            expense_id: entry_id.to_string(),
        };
        self.registry
            .broadcast(user_id, event_type::EXPENSE_DELETED, &payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_entry_changed_uses_action_suffix() {
        let registry = Arc::new(ConnectionRegistry::default());
        let (handle, mut rx) = registry.open_connection(4);
        registry.register("u1", handle);
        let notifier = Notifier::new(registry);

        let delivered = notifier
            .entry_changed("u1", &json!({"id": "E1"}), "updated")
            .await;
        assert_eq!(delivered, 1);

        let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame, json!({"type": "expense_updated", "payload": {"id": "E1"}}));
    }

    #[tokio::test]
    async fn test_entry_deleted_payload() {
        let registry = Arc::new(ConnectionRegistry::default());
        let (handle, mut rx) = registry.open_connection(4);
        registry.register("u1", handle);
        let notifier = Notifier::new(registry);

        notifier.entry_deleted("u1", "E9").await;

        let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame, json!({"type": "expense_deleted", "payload": {"expense_id": "E9"}}));
    }

    #[tokio::test]
    async fn test_offline_user_is_silent() {
        let notifier = Notifier::new(Arc::new(ConnectionRegistry::default()));
        assert_eq!(notifier.entry_created("offline", &json!({"id": "E1"})).await, 0);
    }
}
