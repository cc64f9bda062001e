use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{
    media::{MediaStream, TrackKind, TrackRef},
    quality_controller::QualityController,
    transport::{
        ConnectionState, DataChannel, DataChannelState, IceConnectionState, PeerTransport,
        RtpSender,
    },
};

/// Observer-facing snapshot of a peer, as carried by `peerConnected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    pub peer_id: String,
    pub user_id: String,
    pub is_initiator: bool,
    pub connection_state: ConnectionState,
    pub ice_connection_state: IceConnectionState,
}

/// Everything the manager keeps about one remote participant.
pub struct PeerConnection {
    peer_id: String,
    user_id: String,
    /// Distinguishes this connection from earlier ones under the same id.
    generation: u64,
    transport: Box<dyn PeerTransport>,
    local_stream: Option<MediaStream>,
    /// Filled in as remote tracks arrive.
    remote_stream: Option<MediaStream>,
    data_channel: Option<Arc<dyn DataChannel>>,
    is_initiator: bool,
    connection_state: ConnectionState,
    ice_connection_state: IceConnectionState,
    quality: Option<QualityController>,
}

impl PeerConnection {
    pub(crate) fn new(
        peer_id: impl Into<String>,
        user_id: impl Into<String>,
        generation: u64,
        transport: Box<dyn PeerTransport>,
        is_initiator: bool,
    ) -> Self {
        let connection_state = transport.connection_state();
        let ice_connection_state = transport.ice_connection_state();
        Self {
            peer_id: peer_id.into(),
            user_id: user_id.into(),
            generation,
            transport,
            local_stream: None,
            remote_stream: None,
            data_channel: None,
            is_initiator,
            connection_state,
            ice_connection_state,
            quality: None,
        }
    }

    #[must_use]
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn is_initiator(&self) -> bool {
        self.is_initiator
    }

    #[must_use]
    pub const fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    #[must_use]
    pub const fn ice_connection_state(&self) -> IceConnectionState {
        self.ice_connection_state
    }

    #[must_use]
    pub const fn local_stream(&self) -> Option<&MediaStream> {
        self.local_stream.as_ref()
    }

    #[must_use]
    pub const fn remote_stream(&self) -> Option<&MediaStream> {
        self.remote_stream.as_ref()
    }

    #[must_use]
    pub fn data_channel(&self) -> Option<&Arc<dyn DataChannel>> {
        self.data_channel.as_ref()
    }

    #[must_use]
    pub fn has_open_channel(&self) -> bool {
        self.data_channel
            .as_ref()
            .is_some_and(|dc| dc.ready_state() == DataChannelState::Open)
    }

    #[must_use]
    pub fn transport(&self) -> &dyn PeerTransport {
        self.transport.as_ref()
    }

    #[must_use]
    pub fn info(&self) -> PeerInfo {
        PeerInfo {
            peer_id: self.peer_id.clone(),
            user_id: self.user_id.clone(),
            is_initiator: self.is_initiator,
            connection_state: self.connection_state,
            ice_connection_state: self.ice_connection_state,
        }
    }

    /// The outbound sender currently carrying video, if any.
    #[must_use]
    pub fn video_sender(&self) -> Option<Arc<dyn RtpSender>> {
        self.transport
            .senders()
            .into_iter()
            .find(|s| s.track().is_some_and(|t| t.kind() == TrackKind::Video))
    }

    #[must_use]
    pub fn quality(&self) -> Option<&QualityController> {
        self.quality.as_ref()
    }

    pub(crate) fn transport_mut(&mut self) -> &mut dyn PeerTransport {
        self.transport.as_mut()
    }

    pub(crate) fn set_local_stream(&mut self, stream: MediaStream) {
        self.local_stream = Some(stream);
    }

    pub(crate) fn set_data_channel(&mut self, channel: Arc<dyn DataChannel>) {
        self.data_channel = Some(channel);
    }

    pub(crate) fn quality_mut(&mut self) -> Option<&mut QualityController> {
        self.quality.as_mut()
    }

    pub(crate) fn set_quality(&mut self, controller: QualityController) {
        self.quality = Some(controller);
    }

    pub(crate) const fn set_connection_state(&mut self, state: ConnectionState) {
        self.connection_state = state;
    }

    pub(crate) const fn set_ice_connection_state(&mut self, state: IceConnectionState) {
        self.ice_connection_state = state;
    }

    /// Records a remote track. The first stream the transport names becomes
    /// the remote stream; without one, tracks are collected into our own.
    /// Returns the stream to announce.
    pub(crate) fn add_remote_track(&mut self, track: TrackRef, streams: Vec<MediaStream>) -> MediaStream {
        if let Some(first) = streams.into_iter().next() {
            self.remote_stream = Some(first.clone());
            return first;
        }
        let stream = self
            .remote_stream
            .get_or_insert_with(|| MediaStream::new(Vec::new()));
        stream.add_track(track);
        stream.clone()
    }

    /// Closes the data channel, then the transport.
    pub(crate) fn close(&mut self) {
        if let Some(dc) = self.data_channel.take() {
            dc.close();
        }
        self.transport.close();
        self.connection_state = ConnectionState::Closed;
        self.ice_connection_state = IceConnectionState::Closed;
    }
}

impl fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerConnection")
            .field("peer_id", &self.peer_id)
            .field("user_id", &self.user_id)
            .field("generation", &self.generation)
            .field("is_initiator", &self.is_initiator)
            .field("connection_state", &self.connection_state)
            .field("ice_connection_state", &self.ice_connection_state)
            .field("has_remote_stream", &self.remote_stream.is_some())
            .field("has_data_channel", &self.data_channel.is_some())
            .finish_non_exhaustive()
    }
}
