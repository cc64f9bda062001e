use std::sync::{Arc, mpsc::Sender};

use crate::{
    core::manager_input::ManagerInput,
    media::{MediaStream, TrackRef},
    transport::{
        connection_state::{ConnectionState, IceConnectionState},
        peer_transport::DataChannel,
        session_description::IceCandidate,
    },
};

/// Something a transport observed for its peer.
pub enum PeerEvent {
    /// A local candidate was gathered; `None` marks the end of gathering.
    IceCandidate(Option<IceCandidate>),
    /// A remote track arrived, with the remote streams it belongs to.
    Track {
        track: TrackRef,
        streams: Vec<MediaStream>,
    },
    ConnectionStateChange(ConnectionState),
    IceConnectionStateChange(IceConnectionState),
    NegotiationNeeded,
    /// The remote side opened a channel.
    DataChannel(Arc<dyn DataChannel>),
    DataChannelOpen {
        label: String,
    },
    DataChannelMessage {
        label: String,
        text: String,
    },
    DataChannelError {
        label: String,
        message: String,
    },
    DataChannelClose {
        label: String,
    },
}

impl PeerEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::IceCandidate(_) => "icecandidate",
            Self::Track { .. } => "track",
            Self::ConnectionStateChange(_) => "connectionstatechange",
            Self::IceConnectionStateChange(_) => "iceconnectionstatechange",
            Self::NegotiationNeeded => "negotiationneeded",
            Self::DataChannel(_) => "datachannel",
            Self::DataChannelOpen { .. } => "open",
            Self::DataChannelMessage { .. } => "message",
            Self::DataChannelError { .. } => "error",
            Self::DataChannelClose { .. } => "close",
        }
    }
}

/// Where a transport sends its events. Each sink is bound to one peer id and
/// one connection generation, so events from a replaced connection are
/// recognisable and dropped by the manager.
#[derive(Clone)]
pub struct PeerEventSink {
    peer_id: String,
    generation: u64,
    tx: Sender<ManagerInput>,
}

impl PeerEventSink {
    pub(crate) fn new(peer_id: impl Into<String>, generation: u64, tx: Sender<ManagerInput>) -> Self {
        Self {
            peer_id: peer_id.into(),
            generation,
            tx,
        }
    }

    #[must_use]
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Queues `event` for the manager. Returns `false` once the manager is gone.
    pub fn emit(&self, event: PeerEvent) -> bool {
        self.tx
            .send(ManagerInput::Peer {
                peer_id: self.peer_id.clone(),
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}
