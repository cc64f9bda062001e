use std::collections::HashMap;

use crate::peer::peer_connection::PeerConnection;

/// Exactly one `PeerConnection` per peer id. Only the manager mutates it.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<String, PeerConnection>,
    next_generation: u64,
}

impl PeerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A generation number never handed out before.
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Stores `peer`, returning whatever was registered under its id.
    pub(crate) fn insert(&mut self, peer: PeerConnection) -> Option<PeerConnection> {
        self.peers.insert(peer.peer_id().to_owned(), peer)
    }

    pub(crate) fn remove(&mut self, peer_id: &str) -> Option<PeerConnection> {
        self.peers.remove(peer_id)
    }

    pub(crate) fn get_mut(&mut self, peer_id: &str) -> Option<&mut PeerConnection> {
        self.peers.get_mut(peer_id)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut PeerConnection> {
        self.peers.values_mut()
    }

    pub(crate) fn drain(&mut self) -> Vec<PeerConnection> {
        self.peers.drain().map(|(_, p)| p).collect()
    }

    #[must_use]
    pub fn get(&self, peer_id: &str) -> Option<&PeerConnection> {
        self.peers.get(peer_id)
    }

    #[must_use]
    pub fn contains(&self, peer_id: &str) -> bool {
        self.peers.contains_key(peer_id)
    }

    /// True when `generation` is the live connection for `peer_id`.
    #[must_use]
    pub fn is_current(&self, peer_id: &str, generation: u64) -> bool {
        self.peers
            .get(peer_id)
            .is_some_and(|p| p.generation() == generation)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerConnection> {
        self.peers.values()
    }

    /// Peer ids in sorted order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.peers.keys().cloned().collect();
        ids.sort();
        ids
    }
}
