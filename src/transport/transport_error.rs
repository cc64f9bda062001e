use std::fmt;

/// Failures reported by a transport backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The call is not valid in the current signaling/connection state.
    InvalidState(String),
    /// A description could not be created or applied.
    Sdp(String),
    IceCandidate(String),
    DataChannel(String),
    /// The connection was already closed.
    Closed,
    Backend(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState(what) => write!(f, "invalid state: {what}"),
            Self::Sdp(msg) => write!(f, "SDP error: {msg}"),
            Self::IceCandidate(msg) => write!(f, "ICE candidate error: {msg}"),
            Self::DataChannel(msg) => write!(f, "data channel error: {msg}"),
            Self::Closed => write!(f, "connection closed"),
            Self::Backend(msg) => write!(f, "transport backend error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}
