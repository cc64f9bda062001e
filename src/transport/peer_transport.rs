use std::sync::Arc;

use crate::{
    media::{MediaStream, TrackRef},
    stats::stats_report::StatsReport,
    transport::{
        connection_state::{ConnectionState, IceConnectionState},
        session_description::{IceCandidate, IceServer, SessionDescription},
        transport_error::TransportError,
        transport_event::PeerEventSink,
    },
};

/// Settings handed to every new connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServer>,
}

/// Builds one transport per remote participant.
///
/// The transport reports everything asynchronous (candidates, tracks, state
/// changes, channel traffic) through `events`, from any thread.
pub trait TransportFactory: Send {
    /// # Errors
    /// Backend-specific failure to allocate the connection.
    fn create(
        &self,
        config: &TransportConfig,
        events: PeerEventSink,
    ) -> Result<Box<dyn PeerTransport>, TransportError>;
}

/// One peer connection.
pub trait PeerTransport: Send {
    /// Attaches `track` (belonging to `stream`) for sending.
    ///
    /// # Errors
    /// `Closed` after [`close`](Self::close), or a backend failure.
    fn add_track(
        &mut self,
        track: &TrackRef,
        stream: &MediaStream,
    ) -> Result<Arc<dyn RtpSender>, TransportError>;

    /// Every outbound sender, in the order tracks were added.
    fn senders(&self) -> Vec<Arc<dyn RtpSender>>;

    /// # Errors
    /// `Closed`, or a backend failure.
    fn create_data_channel(
        &mut self,
        label: &str,
        init: DataChannelInit,
    ) -> Result<Arc<dyn DataChannel>, TransportError>;

    /// # Errors
    /// `Sdp` if no offer can be generated in the current state.
    fn create_offer(&mut self) -> Result<SessionDescription, TransportError>;

    /// # Errors
    /// `InvalidState` unless a remote offer has been applied.
    fn create_answer(&mut self) -> Result<SessionDescription, TransportError>;

    /// # Errors
    /// `Sdp` or `InvalidState` when the description does not fit.
    fn set_local_description(&mut self, desc: SessionDescription) -> Result<(), TransportError>;

    /// # Errors
    /// `Sdp` or `InvalidState` when the description does not fit.
    fn set_remote_description(&mut self, desc: SessionDescription)
    -> Result<(), TransportError>;

    /// # Errors
    /// `InvalidState` before a remote description, `IceCandidate` if malformed.
    fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<(), TransportError>;

    /// # Errors
    /// `Closed`, or a backend failure.
    fn get_stats(&self) -> Result<StatsReport, TransportError>;

    fn connection_state(&self) -> ConnectionState;

    fn ice_connection_state(&self) -> IceConnectionState;

    /// Tears the connection down. Idempotent.
    fn close(&mut self);
}

/// Outbound half of one media line.
pub trait RtpSender: Send + Sync {
    fn track(&self) -> Option<TrackRef>;

    /// Swaps the outgoing track in place, without renegotiation.
    ///
    /// # Errors
    /// `InvalidState` if the new track's kind does not match the sender.
    fn replace_track(&self, track: Option<TrackRef>) -> Result<(), TransportError>;

    /// Caps the encoder bitrate for this sender.
    ///
    /// # Errors
    /// Backend failure applying the parameters.
    fn set_max_bitrate(&self, bitrate_bps: u32) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Delivery guarantees requested for a channel. Both limits `None` means reliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataChannelInit {
    pub ordered: bool,
    pub max_retransmits: Option<u16>,
    pub max_packet_life_time_ms: Option<u32>,
}

impl DataChannelInit {
    #[must_use]
    pub const fn reliable_ordered() -> Self {
        Self {
            ordered: true,
            max_retransmits: None,
            max_packet_life_time_ms: None,
        }
    }

    #[must_use]
    pub const fn is_reliable(&self) -> bool {
        self.max_retransmits.is_none() && self.max_packet_life_time_ms.is_none()
    }
}

impl Default for DataChannelInit {
    fn default() -> Self {
        Self::reliable_ordered()
    }
}

/// Message channel multiplexed on a peer connection.
pub trait DataChannel: Send + Sync {
    fn label(&self) -> String;

    fn ready_state(&self) -> DataChannelState;

    /// # Errors
    /// `DataChannel` if the channel is not open or the send buffer rejects it.
    fn send_text(&self, text: &str) -> Result<(), TransportError>;

    /// Idempotent.
    fn close(&self);
}
