//! Per-remote-participant connection records and the registry that owns them.
pub mod peer_connection;
pub mod peer_registry;

pub use peer_connection::{PeerConnection, PeerInfo};
pub use peer_registry::PeerRegistry;
