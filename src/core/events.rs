use std::collections::HashMap;

use crate::{
    core::call_error::ErrorType,
    media::MediaStream,
    peer::PeerInfo,
    stats::ConnectionStats,
    transport::{ConnectionState, IceCandidate, IceConnectionState, SessionDescription},
};

/// Notification delivered to observers of a `CallManager`.
#[derive(Debug, Clone)]
pub enum CallEvent {
    LocalStreamReady(MediaStream),
    RemoteStreamReceived {
        peer_id: String,
        stream: MediaStream,
    },
    PeerConnected(PeerInfo),
    PeerDisconnected {
        peer_id: String,
    },
    ConnectionStateChange {
        peer_id: String,
        state: ConnectionState,
    },
    IceConnectionStateChange {
        peer_id: String,
        state: IceConnectionState,
    },
    /// To be relayed to the remote participant by signaling.
    IceCandidate {
        peer_id: String,
        candidate: IceCandidate,
    },
    /// To be relayed.
    Offer {
        peer_id: String,
        offer: SessionDescription,
    },
    /// To be relayed.
    Answer {
        peer_id: String,
        answer: SessionDescription,
    },
    DataChannelOpen {
        peer_id: String,
    },
    DataChannelMessage {
        peer_id: String,
        data: serde_json::Value,
    },
    /// One complete poll cycle.
    StatsUpdate(HashMap<String, ConnectionStats>),
    ScreenShareStarted(MediaStream),
    ScreenShareStopped,
    AudioToggled {
        enabled: bool,
    },
    VideoToggled {
        enabled: bool,
    },
    BitrateAdjusted {
        peer_id: String,
        bitrate_bps: u32,
    },
    Error {
        error_type: ErrorType,
        message: String,
        peer_id: Option<String>,
    },
    Destroyed,
}

/// Event names, used to subscribe to one kind of `CallEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    LocalStreamReady,
    RemoteStreamReceived,
    PeerConnected,
    PeerDisconnected,
    ConnectionStateChange,
    IceConnectionStateChange,
    IceCandidate,
    Offer,
    Answer,
    DataChannelOpen,
    DataChannelMessage,
    StatsUpdate,
    ScreenShareStarted,
    ScreenShareStopped,
    AudioToggled,
    VideoToggled,
    BitrateAdjusted,
    Error,
    Destroyed,
}

impl EventKind {
    /// Wire name, e.g. `"remoteStreamReceived"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LocalStreamReady => "localStreamReady",
            Self::RemoteStreamReceived => "remoteStreamReceived",
            Self::PeerConnected => "peerConnected",
            Self::PeerDisconnected => "peerDisconnected",
            Self::ConnectionStateChange => "connectionStateChange",
            Self::IceConnectionStateChange => "iceConnectionStateChange",
            Self::IceCandidate => "iceCandidate",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::DataChannelOpen => "dataChannelOpen",
            Self::DataChannelMessage => "dataChannelMessage",
            Self::StatsUpdate => "statsUpdate",
            Self::ScreenShareStarted => "screenShareStarted",
            Self::ScreenShareStopped => "screenShareStopped",
            Self::AudioToggled => "audioToggled",
            Self::VideoToggled => "videoToggled",
            Self::BitrateAdjusted => "bitrateAdjusted",
            Self::Error => "error",
            Self::Destroyed => "destroyed",
        }
    }
}

impl CallEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::LocalStreamReady(_) => EventKind::LocalStreamReady,
            Self::RemoteStreamReceived { .. } => EventKind::RemoteStreamReceived,
            Self::PeerConnected(_) => EventKind::PeerConnected,
            Self::PeerDisconnected { .. } => EventKind::PeerDisconnected,
            Self::ConnectionStateChange { .. } => EventKind::ConnectionStateChange,
            Self::IceConnectionStateChange { .. } => EventKind::IceConnectionStateChange,
            Self::IceCandidate { .. } => EventKind::IceCandidate,
            Self::Offer { .. } => EventKind::Offer,
            Self::Answer { .. } => EventKind::Answer,
            Self::DataChannelOpen { .. } => EventKind::DataChannelOpen,
            Self::DataChannelMessage { .. } => EventKind::DataChannelMessage,
            Self::StatsUpdate(_) => EventKind::StatsUpdate,
            Self::ScreenShareStarted(_) => EventKind::ScreenShareStarted,
            Self::ScreenShareStopped => EventKind::ScreenShareStopped,
            Self::AudioToggled { .. } => EventKind::AudioToggled,
            Self::VideoToggled { .. } => EventKind::VideoToggled,
            Self::BitrateAdjusted { .. } => EventKind::BitrateAdjusted,
            Self::Error { .. } => EventKind::Error,
            Self::Destroyed => EventKind::Destroyed,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// The peer this event concerns, if any.
    #[must_use]
    pub fn peer_id(&self) -> Option<&str> {
        match self {
            Self::RemoteStreamReceived { peer_id, .. }
            | Self::PeerDisconnected { peer_id }
            | Self::ConnectionStateChange { peer_id, .. }
            | Self::IceConnectionStateChange { peer_id, .. }
            | Self::IceCandidate { peer_id, .. }
            | Self::Offer { peer_id, .. }
            | Self::Answer { peer_id, .. }
            | Self::DataChannelOpen { peer_id }
            | Self::DataChannelMessage { peer_id, .. }
            | Self::BitrateAdjusted { peer_id, .. } => Some(peer_id),
            Self::PeerConnected(info) => Some(&info.peer_id),
            Self::Error { peer_id, .. } => peer_id.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_wire_contract() {
        assert_eq!(CallEvent::Destroyed.name(), "destroyed");
        assert_eq!(
            CallEvent::AudioToggled { enabled: true }.name(),
            "audioToggled"
        );
        assert_eq!(EventKind::IceConnectionStateChange.name(), "iceConnectionStateChange");
    }

    #[test]
    fn peer_id_extraction() {
        let ev = CallEvent::Error {
            error_type: ErrorType::OfferHandling,
            message: "bad sdp".into(),
            peer_id: Some("p1".into()),
        };
        assert_eq!(ev.peer_id(), Some("p1"));
        assert_eq!(CallEvent::ScreenShareStopped.peer_id(), None);
        assert_eq!(
            CallEvent::PeerDisconnected { peer_id: "p2".into() }.peer_id(),
            Some("p2")
        );
    }
}
