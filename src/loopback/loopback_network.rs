use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use crate::{
    loopback::{
        loopback_channel::LoopbackChannel, loopback_sender::LoopbackSender,
        loopback_transport::LoopbackFactory,
    },
    media::{MediaStream, MediaTrack, TrackKind, TrackRef},
    stats::{
        CandidatePairState, CandidatePairStats, InboundRtpStats, RemoteInboundRtpStats, RtcStats,
        StatsReport,
    },
    transport::{
        ConnectionState, DataChannel, IceConnectionState, PeerEvent, PeerEventSink, RtpSender,
        SessionDescription, TransportError,
    },
    utils::random_id,
};

const VIDEO_PACKETS_PER_POLL: u64 = 500;
const AUDIO_PACKETS_PER_POLL: u64 = 250;
const VIDEO_BYTES_PER_POLL: u64 = 256 * 1024;
const AUDIO_BYTES_PER_POLL: u64 = 16 * 1024;

/// Simulated path conditions, applied to every connected pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkQuality {
    /// Fraction of packets lost, 0.0 ..= 1.0.
    pub loss: f64,
    pub rtt: Duration,
    pub jitter: Duration,
}

impl Default for LinkQuality {
    fn default() -> Self {
        Self {
            loss: 0.0,
            rtt: Duration::from_millis(20),
            jitter: Duration::from_millis(2),
        }
    }
}

pub(crate) struct Endpoint {
    pub(crate) session_id: String,
    pub(crate) sink: PeerEventSink,
    pub(crate) local: Option<SessionDescription>,
    pub(crate) remote: Option<SessionDescription>,
    pub(crate) remote_endpoint: Option<u64>,
    pub(crate) remote_candidate_applied: bool,
    pub(crate) gathered: bool,
    pub(crate) connected: bool,
    pub(crate) negotiation_pending: bool,
    pub(crate) state: ConnectionState,
    pub(crate) ice_state: IceConnectionState,
    pub(crate) senders: Vec<Arc<LoopbackSender>>,
    pub(crate) channels: Vec<Arc<LoopbackChannel>>,
    /// Id of the stream the remote side sees our tracks in.
    stream_id: String,
    polls: u64,
}

impl Endpoint {
    fn new(session_id: String, sink: PeerEventSink) -> Self {
        Self {
            session_id,
            sink,
            local: None,
            remote: None,
            remote_endpoint: None,
            remote_candidate_applied: false,
            gathered: false,
            connected: false,
            negotiation_pending: false,
            state: ConnectionState::New,
            ice_state: IceConnectionState::New,
            senders: Vec::new(),
            channels: Vec::new(),
            stream_id: random_id("stream"),
            polls: 0,
        }
    }

    fn ready_for(&self, other: u64) -> bool {
        self.local.is_some()
            && self.remote.is_some()
            && self.remote_endpoint == Some(other)
            && !self.connected
            && !self.state.is_terminal()
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.sink.emit(PeerEvent::ConnectionStateChange(state));
    }

    fn set_ice_state(&mut self, state: IceConnectionState) {
        self.ice_state = state;
        self.sink.emit(PeerEvent::IceConnectionStateChange(state));
    }

    fn sent_tracks(&self) -> Vec<TrackRef> {
        self.senders.iter().filter_map(|s| s.track()).collect()
    }

    /// Raises `negotiationneeded` unless one is already outstanding.
    pub(crate) fn request_negotiation(&mut self) {
        if !self.negotiation_pending {
            self.negotiation_pending = true;
            self.sink.emit(PeerEvent::NegotiationNeeded);
        }
    }
}

#[derive(Default)]
pub(crate) struct NetworkState {
    next_id: u64,
    pub(crate) endpoints: HashMap<u64, Endpoint>,
    link: LinkQuality,
    refuse_connections: bool,
    pub(crate) refuse_offers: bool,
}

impl NetworkState {
    pub(crate) fn endpoint_mut(&mut self, id: u64) -> Result<&mut Endpoint, TransportError> {
        self.endpoints.get_mut(&id).ok_or(TransportError::Closed)
    }

    /// Connects `a` with its counterpart once both sides hold both
    /// descriptions and a remote candidate has been applied on either side.
    pub(crate) fn try_connect(&mut self, a: u64) {
        let Some(b) = self.endpoints.get(&a).and_then(|e| e.remote_endpoint) else {
            return;
        };
        let (Some(ea), Some(eb)) = (self.endpoints.get(&a), self.endpoints.get(&b)) else {
            return;
        };
        if !(ea.ready_for(b) && eb.ready_for(a)) {
            return;
        }
        if !(ea.remote_candidate_applied || eb.remote_candidate_applied) {
            return;
        }

        for id in [a, b] {
            if let Some(ep) = self.endpoints.get_mut(&id) {
                ep.connected = true;
                ep.set_state(ConnectionState::Connecting);
                ep.set_ice_state(IceConnectionState::Checking);
                ep.set_ice_state(IceConnectionState::Connected);
                ep.set_state(ConnectionState::Connected);
            }
        }

        for (receiver, sender) in [(a, b), (b, a)] {
            self.deliver_tracks(receiver, sender);
        }
        for (owner, other) in [(a, b), (b, a)] {
            self.pair_channels(owner, other);
        }
    }

    fn deliver_tracks(&self, receiver: u64, sender: u64) {
        let (Some(rx), Some(tx)) = (self.endpoints.get(&receiver), self.endpoints.get(&sender))
        else {
            return;
        };
        let remote_tracks: Vec<TrackRef> = tx
            .sent_tracks()
            .iter()
            .map(|t| MediaTrack::new(t.kind(), t.label(), t.settings()))
            .collect();
        if remote_tracks.is_empty() {
            return;
        }
        let stream = MediaStream::with_id(tx.stream_id.clone(), remote_tracks.clone());
        for track in remote_tracks {
            rx.sink.emit(PeerEvent::Track {
                track,
                streams: vec![stream.clone()],
            });
        }
    }

    fn pair_channels(&mut self, owner: u64, other: u64) {
        let Some(unpaired) = self.endpoints.get(&owner).map(|e| {
            e.channels
                .iter()
                .filter(|c| !c.is_paired())
                .cloned()
                .collect::<Vec<_>>()
        }) else {
            return;
        };
        let Some(remote) = self.endpoints.get_mut(&other) else {
            return;
        };
        for local in unpaired {
            let counterpart = Arc::new(LoopbackChannel::new(
                local.label(),
                local.init(),
                remote.sink.clone(),
            ));
            remote.channels.push(counterpart.clone());
            counterpart.announce_inbound();
            LoopbackChannel::pair(&local, &counterpart);
        }
    }

    /// Synthesized `getStats()` for endpoint `id`, built from what its
    /// counterpart is currently sending.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub(crate) fn stats(&mut self, id: u64) -> Result<StatsReport, TransportError> {
        let link = self.link;
        let ep = self.endpoints.get(&id).ok_or(TransportError::Closed)?;
        let remote = ep.remote_endpoint.and_then(|r| self.endpoints.get(&r));
        let (true, Some(remote)) = (ep.connected, remote) else {
            return Ok(StatsReport::new(vec![RtcStats::CandidatePair(CandidatePairStats {
                state: CandidatePairState::InProgress,
                nominated: false,
                current_round_trip_time: None,
            })]));
        };
        let incoming = remote.sent_tracks();
        let sends_video = ep
            .sent_tracks()
            .iter()
            .any(|t| t.kind() == TrackKind::Video);

        let polls = ep.polls + 1;
        let lost_of = |packets: u64| (packets as f64 * link.loss).round() as i64;
        let rtt = link.rtt.as_secs_f64();
        let mut entries = Vec::new();

        for track in &incoming {
            let live = track.is_enabled();
            let settings = track.settings();
            let entry = match track.kind() {
                TrackKind::Video => {
                    let packets = polls * VIDEO_PACKETS_PER_POLL;
                    InboundRtpStats {
                        kind: Some(TrackKind::Video),
                        bytes_received: polls * VIDEO_BYTES_PER_POLL,
                        packets_received: packets,
                        packets_lost: lost_of(packets),
                        frame_width: settings.width.filter(|_| live),
                        frame_height: settings.height.filter(|_| live),
                        frames_per_second: settings.frame_rate.filter(|_| live),
                        ..InboundRtpStats::default()
                    }
                }
                TrackKind::Audio => {
                    let packets = polls * AUDIO_PACKETS_PER_POLL;
                    InboundRtpStats {
                        kind: Some(TrackKind::Audio),
                        bytes_received: polls * AUDIO_BYTES_PER_POLL,
                        packets_received: packets,
                        packets_lost: lost_of(packets),
                        audio_level: Some(if live { 0.5 } else { 0.0 }),
                        jitter: Some(link.jitter.as_secs_f64()),
                        ..InboundRtpStats::default()
                    }
                }
            };
            entries.push(RtcStats::InboundRtp(entry));
        }

        entries.push(RtcStats::CandidatePair(CandidatePairStats {
            state: CandidatePairState::Succeeded,
            nominated: true,
            current_round_trip_time: Some(rtt),
        }));
        if sends_video {
            entries.push(RtcStats::RemoteInboundRtp(RemoteInboundRtpStats {
                kind: Some(TrackKind::Video),
                fraction_lost: link.loss,
                packets_lost: lost_of(polls * VIDEO_PACKETS_PER_POLL),
                round_trip_time: Some(rtt),
            }));
        }
        entries.push(RtcStats::Other {
            stats_type: "transport".into(),
        });

        if let Some(ep) = self.endpoints.get_mut(&id) {
            ep.polls = polls;
        }
        Ok(StatsReport::new(entries))
    }

    /// Removes endpoint `id`. A connected counterpart sees `disconnected`.
    pub(crate) fn close(&mut self, id: u64) -> Vec<Arc<LoopbackChannel>> {
        let Some(ep) = self.endpoints.remove(&id) else {
            return Vec::new();
        };
        if ep.connected {
            if let Some(remote) = ep
                .remote_endpoint
                .and_then(|r| self.endpoints.get_mut(&r))
                .filter(|r| r.connected)
            {
                remote.connected = false;
                remote.set_ice_state(IceConnectionState::Disconnected);
                remote.set_state(ConnectionState::Disconnected);
            }
        }
        ep.channels
    }
}

/// In-process hub that pairs loopback transports by the endpoint id carried
/// in their session descriptions. Clones share the same hub.
#[derive(Clone, Default)]
pub struct LoopbackNetwork {
    inner: Arc<Mutex<NetworkState>>,
}

impl LoopbackNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport factory for the manager of `session_id`.
    #[must_use]
    pub fn factory(&self, session_id: impl Into<String>) -> LoopbackFactory {
        LoopbackFactory::new(self.clone(), session_id.into())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, NetworkState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register(
        &self,
        session_id: String,
        sink: PeerEventSink,
    ) -> Result<u64, TransportError> {
        let mut st = self.lock();
        if st.refuse_connections {
            return Err(TransportError::Backend(
                "loopback network is refusing connections".into(),
            ));
        }
        st.next_id += 1;
        let id = st.next_id;
        st.endpoints.insert(id, Endpoint::new(session_id, sink));
        Ok(id)
    }

    pub fn set_link_quality(&self, quality: LinkQuality) {
        self.lock().link = quality;
    }

    #[must_use]
    pub fn link_quality(&self) -> LinkQuality {
        self.lock().link
    }

    /// Makes new transports fail to create.
    pub fn set_refuse_connections(&self, refuse: bool) {
        self.lock().refuse_connections = refuse;
    }

    /// Makes every transport fail to create an offer.
    pub fn set_refuse_offers(&self, refuse: bool) {
        self.lock().refuse_offers = refuse;
    }

    /// Number of transports not yet closed.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.lock().endpoints.len()
    }

    fn find(st: &NetworkState, session_id: &str, peer_id: &str) -> Option<u64> {
        st.endpoints
            .iter()
            .filter(|(_, e)| e.session_id == session_id && e.sink.peer_id() == peer_id)
            .map(|(id, _)| *id)
            .max()
    }

    /// Drives the newest transport of `peer_id` in `session_id` to `failed`.
    /// Returns `false` if there is no such transport.
    pub fn fail_peer(&self, session_id: &str, peer_id: &str) -> bool {
        let mut st = self.lock();
        let Some(ep) = Self::find(&st, session_id, peer_id).and_then(|id| st.endpoints.get_mut(&id))
        else {
            return false;
        };
        ep.connected = false;
        ep.set_ice_state(IceConnectionState::Failed);
        ep.set_state(ConnectionState::Failed);
        true
    }

    /// Makes the senders of `peer_id` in `session_id` refuse (or accept
    /// again) track replacement. Returns `false` if there is no such transport.
    pub fn freeze_senders(&self, session_id: &str, peer_id: &str, frozen: bool) -> bool {
        let st = self.lock();
        let Some(ep) = Self::find(&st, session_id, peer_id).and_then(|id| st.endpoints.get(&id))
        else {
            return false;
        };
        for sender in &ep.senders {
            sender.set_frozen(frozen);
        }
        true
    }

    /// Last bitrate cap applied to the video sender of `peer_id` in `session_id`.
    #[must_use]
    pub fn max_bitrate(&self, session_id: &str, peer_id: &str) -> Option<u32> {
        let st = self.lock();
        let ep = Self::find(&st, session_id, peer_id).and_then(|id| st.endpoints.get(&id))?;
        ep.senders
            .iter()
            .find(|s| s.track().is_some_and(|t| t.kind() == TrackKind::Video))
            .and_then(|s| s.max_bitrate())
    }
}
