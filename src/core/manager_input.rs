use crate::transport::transport_event::PeerEvent;

/// Everything that reaches the manager from outside the caller's thread.
pub(crate) enum ManagerInput {
    Peer {
        peer_id: String,
        generation: u64,
        event: PeerEvent,
    },
    /// A local capture track ended at its source (for example the OS
    /// "stop sharing" button).
    LocalTrackEnded { track_id: String },
    StatsTick,
}
