use std::fmt;

use crate::{media::MediaError, transport::TransportError};

/// Tag carried by `CallEvent::Error`, telling observers which step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    MediaAccess,
    PeerCreation,
    OfferCreation,
    OfferHandling,
    AnswerHandling,
    IceCandidate,
    DataChannel,
    ScreenShareStart,
    ScreenShareStop,
}

impl ErrorType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MediaAccess => "media_access",
            Self::PeerCreation => "peer_creation",
            Self::OfferCreation => "offer_creation",
            Self::OfferHandling => "offer_handling",
            Self::AnswerHandling => "answer_handling",
            Self::IceCandidate => "ice_candidate",
            Self::DataChannel => "data_channel",
            Self::ScreenShareStart => "screen_share_start",
            Self::ScreenShareStop => "screen_share_stop",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures returned directly to the caller of a `CallManager` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Camera or microphone could not be acquired.
    MediaAccess(MediaError),
    /// Display capture could not be started.
    ScreenShare(MediaError),
    Transport(TransportError),
    Serialization(String),
    /// The manager was already destroyed.
    Destroyed,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MediaAccess(e) => write!(f, "media access failed: {e}"),
            Self::ScreenShare(e) => write!(f, "screen share failed: {e}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Serialization(msg) => write!(f, "serialization error: {msg}"),
            Self::Destroyed => write!(f, "call manager already destroyed"),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MediaAccess(e) | Self::ScreenShare(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::Serialization(_) | Self::Destroyed => None,
        }
    }
}

impl From<TransportError> for CallError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<serde_json::Error> for CallError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
