//! Presence Registry - which users currently hold a live WebSocket connection

use crate::dtos::WsEventDTO;
use crate::ws::PRESENCE_CHANNEL_CAPACITY;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};

/// Signals consumed by a connection's writer task.
#[derive(Debug, Clone)]
pub enum InternalSignal {
    Shutdown,
    Deliver(Arc<WsEventDTO>),
    Error { code: u16, message: &'static str },
}

pub type ConnectionId = u64;

/// Registry change, published for whoever announces presence to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceChange {
    Online(i32),
    Offline(i32),
}

struct Connection {
    id: ConnectionId,
    tx: UnboundedSender<InternalSignal>,
}

pub struct PresenceRegistry {
    users_online: DashMap<i32, Connection>,
    next_connection_id: AtomicU64,
    changes: broadcast::Sender<PresenceChange>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(PRESENCE_CHANNEL_CAPACITY);
        PresenceRegistry {
            users_online: DashMap::new(),
            next_connection_id: AtomicU64::new(1),
            changes,
        }
    }

    /// Associates `user_id` with a connection handle. A previous connection of the
    /// same user is told to shut down and replaced: one active connection per user.
    #[instrument(skip(self, tx))]
    pub fn register(&self, user_id: i32, tx: UnboundedSender<InternalSignal>) -> ConnectionId {
        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        if let Some(previous) = self.users_online.insert(user_id, Connection { id, tx }) {
            info!(previous_connection = previous.id, "Replacing existing connection");
            let _ = previous.tx.send(InternalSignal::Shutdown);
        }
        info!(connection_id = id, online = self.users_online.len(), "User registered as online");
        self.publish(PresenceChange::Online(user_id));
        id
    }

    /// Removes the mapping for `user_id`, whatever connection it points to.
    /// Idempotent: returns false if the user was not online.
    #[instrument(skip(self))]
    pub fn unregister(&self, user_id: i32) -> bool {
        let removed = self.users_online.remove(&user_id).is_some();
        if removed {
            info!("User removed from online");
            self.publish(PresenceChange::Offline(user_id));
        }
        removed
    }

    /// Removes the mapping only if it still belongs to `connection_id`, so a closing
    /// stale socket cannot evict the connection that replaced it.
    #[instrument(skip(self))]
    pub fn unregister_connection(&self, user_id: i32, connection_id: ConnectionId) -> bool {
        let removed = self
            .users_online
            .remove_if(&user_id, |_, conn| conn.id == connection_id)
            .is_some();
        if removed {
            info!("Connection closed, user removed from online");
            self.publish(PresenceChange::Offline(user_id));
        }
        removed
    }

    /// Live handle of `user_id`, if connected.
    pub fn lookup(&self, user_id: i32) -> Option<UnboundedSender<InternalSignal>> {
        self.users_online.get(&user_id).map(|conn| conn.tx.clone())
    }

    /// Hands `signal` to the user's connection without waiting.
    /// Returns true if a live connection accepted it.
    #[instrument(skip(self, signal))]
    pub fn send_if_online(&self, user_id: i32, signal: InternalSignal) -> bool {
        let Some(tx) = self.lookup(user_id) else {
            info!("User not online, signal dropped");
            return false;
        };
        match tx.send(signal) {
            Ok(()) => true,
            Err(_) => {
                warn!("Connection writer is gone, signal dropped");
                false
            }
        }
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<PresenceChange> {
        self.changes.subscribe()
    }

    pub fn online_count(&self) -> usize {
        self.users_online.len()
    }

    pub fn is_user_online(&self, user_id: i32) -> bool {
        self.users_online.contains_key(&user_id)
    }

    /// Ids of every online user, sorted.
    pub fn online_users(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.users_online.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    fn publish(&self, change: PresenceChange) {
        // no subscribers is fine, nobody is announcing presence
        let _ = self.changes.send(change);
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn second_registration_replaces_and_shuts_down_the_first() {
        let registry = PresenceRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        registry.register(1, tx1);
        registry.register(1, tx2);

        assert_eq!(registry.online_count(), 1);
        assert!(matches!(rx1.try_recv(), Ok(InternalSignal::Shutdown)));
        // the old sender was dropped with the replaced entry
        assert!(rx1.try_recv().is_err());
    }

    #[test]
    fn stale_connection_cannot_evict_its_replacement() {
        let registry = PresenceRegistry::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        let old = registry.register(1, tx1);
        let new = registry.register(1, tx2);

        assert!(!registry.unregister_connection(1, old));
        assert!(registry.is_user_online(1));
        assert!(registry.unregister_connection(1, new));
        assert!(!registry.is_user_online(1));
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = PresenceRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.register(5, tx);

        assert!(registry.unregister(5));
        assert!(!registry.unregister(5));
        assert!(registry.lookup(5).is_none());
    }

    #[test]
    fn changes_are_published() {
        let registry = PresenceRegistry::new();
        let mut changes = registry.subscribe_changes();
        let (tx, _rx) = mpsc::unbounded_channel();

        registry.register(3, tx);
        registry.unregister(3);

        assert_eq!(changes.try_recv().unwrap(), PresenceChange::Online(3));
        assert_eq!(changes.try_recv().unwrap(), PresenceChange::Offline(3));
    }

    #[test]
    fn online_users_are_sorted() {
        let registry = PresenceRegistry::new();
        for id in [9, 2, 5] {
            let (tx, rx) = mpsc::unbounded_channel();
            std::mem::forget(rx);
            registry.register(id, tx);
        }
        assert_eq!(registry.online_users(), vec![2, 5, 9]);
    }
}
