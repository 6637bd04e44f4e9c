//! Session registry
//!
//! Maps peer ids to live connections. Reads during broadcast iterate a
//! snapshot of ids, so a disconnect firing mid-broadcast (same tick,
//! same thread) never invalidates the iteration; a removed peer is
//! simply skipped.

use std::collections::HashMap;

use peerlink_core::PeerId;

use crate::Connection;

/// Registry of live peer connections; a peer id appears at most once.
#[derive(Default)]
pub struct SessionRegistry {
    peers: HashMap<PeerId, Connection>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or create the connection for a peer. Returns the
    /// connection and whether it was newly registered.
    pub fn register(&mut self, peer: PeerId) -> (&mut Connection, bool) {
        let mut newly = false;
        let connection = self.peers.entry(peer).or_insert_with(|| {
            newly = true;
            Connection::new(peer)
        });
        (connection, newly)
    }

    pub fn lookup(&self, peer: PeerId) -> Option<&Connection> {
        self.peers.get(&peer)
    }

    pub fn contains(&self, peer: PeerId) -> bool {
        self.peers.contains_key(&peer)
    }

    pub fn remove(&mut self, peer: PeerId) -> Option<Connection> {
        self.peers.remove(&peer)
    }

    /// Consistent id snapshot for iteration under mutation
    pub fn snapshot(&self) -> Vec<PeerId> {
        self.peers.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_create_if_absent() {
        let mut registry = SessionRegistry::new();
        let (_, newly) = registry.register(PeerId::new(1));
        assert!(newly);
        let (_, newly) = registry.register(PeerId::new(1));
        assert!(!newly);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_enables_fresh_registration() {
        let mut registry = SessionRegistry::new();
        registry.register(PeerId::new(7));
        assert!(registry.remove(PeerId::new(7)).is_some());
        assert!(registry.remove(PeerId::new(7)).is_none());
        let (_, newly) = registry.register(PeerId::new(7));
        assert!(newly);
    }

    #[test]
    fn test_snapshot_survives_mutation() {
        let mut registry = SessionRegistry::new();
        for id in 1..=3u64 {
            registry.register(PeerId::new(id));
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 3);

        // Mutating mid-iteration: removed peers are skipped, the
        // snapshot itself stays intact.
        let mut visited = 0;
        for peer in snapshot {
            registry.remove(PeerId::new(2));
            if registry.contains(peer) {
                visited += 1;
            }
        }
        assert_eq!(visited, 2);
    }
}
