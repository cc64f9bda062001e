//! The per-peer transport seam: what a connection backend must provide and
//! the events it reports back to the manager.
pub mod connection_state;
pub mod peer_transport;
pub mod session_description;
pub mod transport_error;
pub mod transport_event;

pub use connection_state::{ConnectionState, IceConnectionState};
pub use peer_transport::{
    DataChannel, DataChannelInit, DataChannelState, PeerTransport, RtpSender, TransportConfig,
    TransportFactory,
};
pub use session_description::{IceCandidate, IceServer, SdpType, SessionDescription};
pub use transport_error::TransportError;
pub use transport_event::{PeerEvent, PeerEventSink};
