use std::{
    collections::HashMap,
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
    time::{Duration, Instant},
};

use serde::Serialize;

use crate::{
    core::{
        call_config::CallConfig,
        call_error::{CallError, ErrorType},
        event_bus::{EventBus, ListenerId},
        events::{CallEvent, EventKind},
        manager_input::ManagerInput,
        session::Session,
    },
    log::LogSink,
    media::{
        LocalMedia, MediaConstraints, MediaDevices, MediaError, MediaStream, MediaTrack, TrackKind,
        TrackState,
    },
    peer::{PeerConnection, PeerInfo, PeerRegistry},
    quality_controller::QualityController,
    sink_debug, sink_error, sink_info, sink_trace, sink_warn,
    stats::{ConnectionStats, StatsCollector, stats_ticker::StatsTicker},
    transport::{
        ConnectionState, DataChannelInit, DataChannelState, IceCandidate, PeerEvent,
        PeerEventSink, SessionDescription, TransportFactory,
    },
};

/// Owns one call: local media, every peer connection, the stats timer and
/// the observers.
///
/// All state is mutated on the thread that calls `&mut self` methods.
/// Transports, the stats timer and ending capture tracks only enqueue
/// inputs, which [`poll`](Self::poll) applies in arrival order.
pub struct CallManager {
    session: Session,
    config: CallConfig,
    devices: Box<dyn MediaDevices>,
    factory: Box<dyn TransportFactory>,
    logger: Arc<dyn LogSink>,

    bus: EventBus,
    peers: PeerRegistry,
    media: LocalMedia,
    latest_stats: HashMap<String, ConnectionStats>,
    collector: StatsCollector,

    input_tx: Sender<ManagerInput>,
    input_rx: Receiver<ManagerInput>,
    ticker: Option<StatsTicker>,
    destroyed: bool,
}

impl CallManager {
    /// Creates the manager and starts the periodic stats timer.
    pub fn new(
        session: Session,
        config: CallConfig,
        devices: Box<dyn MediaDevices>,
        factory: Box<dyn TransportFactory>,
        logger: Arc<dyn LogSink>,
    ) -> Self {
        let (input_tx, input_rx) = mpsc::channel();
        let ticker = StatsTicker::spawn(config.stats_interval, input_tx.clone(), logger.clone());
        sink_info!(
            logger,
            "[Peer] session {} started for user {}",
            session.session_id(),
            session.local_user_id()
        );
        Self {
            session,
            config,
            devices,
            factory,
            logger,
            bus: EventBus::new(),
            peers: PeerRegistry::new(),
            media: LocalMedia::new(),
            latest_stats: HashMap::new(),
            collector: StatsCollector::new(),
            input_tx,
            input_rx,
            ticker: Some(ticker),
            destroyed: false,
        }
    }

    // ---------------------------------------------------------------------
    // Observers
    // ---------------------------------------------------------------------

    pub fn on(
        &mut self,
        kind: EventKind,
        f: impl FnMut(&CallEvent) + Send + 'static,
    ) -> ListenerId {
        self.bus.on(kind, f)
    }

    pub fn on_any(&mut self, f: impl FnMut(&CallEvent) + Send + 'static) -> ListenerId {
        self.bus.on_any(f)
    }

    /// Events of `kind` (or all events) on a channel. Drop the receiver to
    /// unsubscribe.
    pub fn subscribe(&mut self, kind: Option<EventKind>) -> Receiver<CallEvent> {
        self.bus.subscribe(kind).1
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.bus.off(id)
    }

    // ---------------------------------------------------------------------
    // Read-only views
    // ---------------------------------------------------------------------

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn config(&self) -> &CallConfig {
        &self.config
    }

    #[must_use]
    pub const fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    #[must_use]
    pub fn peer(&self, peer_id: &str) -> Option<&PeerConnection> {
        self.peers.get(peer_id)
    }

    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub const fn local_stream(&self) -> Option<&MediaStream> {
        self.media.camera()
    }

    #[must_use]
    pub const fn screen_stream(&self) -> Option<&MediaStream> {
        self.media.screen()
    }

    #[must_use]
    pub const fn is_screen_sharing(&self) -> bool {
        self.media.is_sharing()
    }

    /// The map published by the last stats cycle.
    #[must_use]
    pub const fn latest_stats(&self) -> &HashMap<String, ConnectionStats> {
        &self.latest_stats
    }

    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ---------------------------------------------------------------------
    // Local media
    // ---------------------------------------------------------------------

    /// Opens camera and microphone, with the configured constraints unless
    /// `constraints` overrides them.
    ///
    /// # Errors
    /// `MediaAccess` when the device layer refuses; an `error` event tagged
    /// `media_access` is emitted as well.
    pub fn acquire_local_stream(
        &mut self,
        constraints: Option<MediaConstraints>,
    ) -> Result<MediaStream, CallError> {
        if self.destroyed {
            return Err(CallError::Destroyed);
        }
        let constraints = constraints.unwrap_or(self.config.media);
        match self.devices.get_user_media(&constraints) {
            Ok(stream) => {
                sink_info!(
                    self.logger,
                    "[Media] local stream {} ready ({} tracks)",
                    stream.id(),
                    stream.tracks().len()
                );
                self.adopt_on_peers(&stream);
                self.media.set_camera(stream.clone());
                self.emit(CallEvent::LocalStreamReady(stream.clone()));
                Ok(stream)
            }
            Err(e) => {
                self.report_error(ErrorType::MediaAccess, &e.to_string(), None);
                Err(CallError::MediaAccess(e))
            }
        }
    }

    /// Sets (or flips, with `None`) every local audio track. Returns the new
    /// state, or `false` without emitting anything when there is no audio.
    pub fn toggle_audio(&mut self, enabled: Option<bool>) -> bool {
        self.toggle(TrackKind::Audio, enabled)
    }

    /// Same as [`toggle_audio`](Self::toggle_audio), for video.
    pub fn toggle_video(&mut self, enabled: Option<bool>) -> bool {
        self.toggle(TrackKind::Video, enabled)
    }

    fn toggle(&mut self, kind: TrackKind, enabled: Option<bool>) -> bool {
        let Some(now) = self.media.toggle(kind, enabled) else {
            sink_debug!(self.logger, "[Media] no local {} track to toggle", kind.as_str());
            return false;
        };
        sink_info!(self.logger, "[Media] {} enabled: {now}", kind.as_str());
        self.emit(match kind {
            TrackKind::Audio => CallEvent::AudioToggled { enabled: now },
            TrackKind::Video => CallEvent::VideoToggled { enabled: now },
        });
        now
    }

    /// Moves every attached peer onto the tracks of a freshly acquired
    /// stream before the previous one is stopped. A video sender carrying
    /// the screen stays on it; `stop_screen_share` restores the new camera.
    fn adopt_on_peers(&mut self, stream: &MediaStream) {
        let screen = self.media.screen_video_track().cloned();
        for peer in self.peers.iter_mut() {
            if peer.local_stream().is_none() {
                continue;
            }
            for sender in peer.transport().senders() {
                let Some(current) = sender.track() else {
                    continue;
                };
                if screen.as_ref().is_some_and(|s| MediaTrack::same(s, &current)) {
                    continue;
                }
                let kind = current.kind();
                let Some(next) = stream.tracks_of(kind).next() else {
                    continue;
                };
                if let Err(e) = sender.replace_track(Some(next.clone())) {
                    sink_warn!(
                        self.logger,
                        "[Media] {}: could not move {} sender to new stream: {e}",
                        peer.peer_id(),
                        kind.as_str()
                    );
                }
            }
            peer.set_local_stream(stream.clone());
        }
    }

    // ---------------------------------------------------------------------
    // Peer lifecycle
    // ---------------------------------------------------------------------

    /// Builds a connection to `peer_id`, attaching the local stream if there
    /// is one. The initiator opens the data channel and will send the offer
    /// once the transport asks for negotiation.
    ///
    /// An existing peer under the same id is closed and replaced.
    ///
    /// # Errors
    /// `Transport` if the backend cannot create the connection; an `error`
    /// event tagged `peer_creation` is emitted as well.
    pub fn create_peer_connection(
        &mut self,
        peer_id: &str,
        user_id: &str,
        is_initiator: bool,
    ) -> Result<PeerInfo, CallError> {
        if self.destroyed {
            return Err(CallError::Destroyed);
        }

        let generation = self.peers.next_generation();
        let sink = PeerEventSink::new(peer_id, generation, self.input_tx.clone());
        let transport = match self.factory.create(&self.config.transport_config(), sink) {
            Ok(t) => t,
            Err(e) => {
                self.report_error(ErrorType::PeerCreation, &e.to_string(), Some(peer_id));
                return Err(e.into());
            }
        };
        let mut peer = PeerConnection::new(peer_id, user_id, generation, transport, is_initiator);

        if self.media.is_sharing() {
            sink_warn!(
                self.logger,
                "[Screen] peer {peer_id} joins during a screen share and starts with the camera track"
            );
        }

        if let Some(stream) = self.media.camera().cloned() {
            for track in stream.tracks() {
                if let Err(e) = peer.transport_mut().add_track(track, &stream) {
                    sink_warn!(
                        self.logger,
                        "[Peer] could not attach {} track to {peer_id}: {e}",
                        track.kind().as_str()
                    );
                }
            }
            peer.set_local_stream(stream);
        }

        if self.config.quality.adaptive_bitrate {
            let q = self.config.quality;
            let controller =
                QualityController::new(q.initial_bitrate, q.min_bitrate, q.max_bitrate, self.logger.clone());
            if let Some(sender) = peer.video_sender() {
                if let Err(e) = sender.set_max_bitrate(controller.current_bitrate()) {
                    sink_warn!(self.logger, "[Quality] initial bitrate for {peer_id}: {e}");
                }
            }
            peer.set_quality(controller);
        }

        let mut channel_error = None;
        if is_initiator {
            match peer
                .transport_mut()
                .create_data_channel(&self.config.data_channel_label, DataChannelInit::reliable_ordered())
            {
                Ok(dc) => peer.set_data_channel(dc),
                Err(e) => channel_error = Some(e),
            }
        }

        let info = peer.info();
        if let Some(mut old) = self.peers.insert(peer) {
            sink_info!(
                self.logger,
                "[Peer] replacing existing connection for {peer_id} (generation {})",
                old.generation()
            );
            old.close();
            self.collector.forget(peer_id);
            self.latest_stats.remove(peer_id);
        }
        sink_info!(
            self.logger,
            "[Peer] created {peer_id} for user {user_id} (initiator: {is_initiator})"
        );

        if let Some(e) = channel_error {
            self.report_error(ErrorType::DataChannel, &e.to_string(), Some(peer_id));
        }
        self.emit(CallEvent::PeerConnected(info.clone()));
        Ok(info)
    }

    /// Applies a remote offer and emits the answer for relay. Unknown peers
    /// are logged and ignored.
    pub fn handle_offer(&mut self, peer_id: &str, offer: SessionDescription) {
        let Some(peer) = self.live_peer_mut(peer_id, "offer") else {
            return;
        };
        let transport = peer.transport_mut();
        let result = transport.set_remote_description(offer).and_then(|()| {
            let answer = transport.create_answer()?;
            transport.set_local_description(answer.clone())?;
            Ok(answer)
        });
        match result {
            Ok(answer) => {
                sink_debug!(self.logger, "[Signal] answering offer from {peer_id}");
                self.emit(CallEvent::Answer {
                    peer_id: peer_id.to_owned(),
                    answer,
                });
            }
            Err(e) => self.report_error(ErrorType::OfferHandling, &e.to_string(), Some(peer_id)),
        }
    }

    pub fn handle_answer(&mut self, peer_id: &str, answer: SessionDescription) {
        let Some(peer) = self.live_peer_mut(peer_id, "answer") else {
            return;
        };
        if let Err(e) = peer.transport_mut().set_remote_description(answer) {
            self.report_error(ErrorType::AnswerHandling, &e.to_string(), Some(peer_id));
        } else {
            sink_debug!(self.logger, "[Signal] applied answer from {peer_id}");
        }
    }

    pub fn handle_ice_candidate(&mut self, peer_id: &str, candidate: IceCandidate) {
        let Some(peer) = self.live_peer_mut(peer_id, "ICE candidate") else {
            return;
        };
        if let Err(e) = peer.transport_mut().add_ice_candidate(candidate) {
            self.report_error(ErrorType::IceCandidate, &e.to_string(), Some(peer_id));
        }
    }

    /// Closes and forgets one peer. Returns `false` if it was not registered.
    pub fn remove_peer(&mut self, peer_id: &str) -> bool {
        self.teardown_peer(peer_id)
    }

    fn live_peer_mut(&mut self, peer_id: &str, what: &str) -> Option<&mut PeerConnection> {
        if self.destroyed {
            return None;
        }
        let peer = self.peers.get_mut(peer_id);
        if peer.is_none() {
            sink_warn!(self.logger, "[Signal] {what} for unknown peer {peer_id}, ignored");
        }
        peer
    }

    fn teardown_peer(&mut self, peer_id: &str) -> bool {
        let Some(mut peer) = self.peers.remove(peer_id) else {
            return false;
        };
        peer.close();
        self.collector.forget(peer_id);
        self.latest_stats.remove(peer_id);
        sink_info!(self.logger, "[Peer] {peer_id} disconnected");
        self.emit(CallEvent::PeerDisconnected {
            peer_id: peer_id.to_owned(),
        });
        true
    }

    fn send_offer(&mut self, peer_id: &str) {
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return;
        };
        if !peer.is_initiator() {
            sink_debug!(self.logger, "[Signal] {peer_id}: negotiation needed, waiting for remote offer");
            return;
        }
        let transport = peer.transport_mut();
        let result = transport.create_offer().and_then(|offer| {
            transport.set_local_description(offer.clone())?;
            Ok(offer)
        });
        match result {
            Ok(offer) => {
                sink_debug!(self.logger, "[Signal] sending offer to {peer_id}");
                self.emit(CallEvent::Offer {
                    peer_id: peer_id.to_owned(),
                    offer,
                });
            }
            Err(e) => self.report_error(ErrorType::OfferCreation, &e.to_string(), Some(peer_id)),
        }
    }

    // ---------------------------------------------------------------------
    // Data channel
    // ---------------------------------------------------------------------

    /// Sends `data` as one JSON text frame if the peer's channel is open.
    /// Otherwise logs and drops it. Returns whether it was handed to the channel.
    pub fn send_data_to_peer<T: Serialize + ?Sized>(&self, peer_id: &str, data: &T) -> bool {
        let text = match serde_json::to_string(data) {
            Ok(t) => t,
            Err(e) => {
                sink_error!(self.logger, "[Data] cannot serialize payload for {peer_id}: {e}");
                return false;
            }
        };
        self.send_text(peer_id, &text)
    }

    /// Serializes once and sends to every open channel. A failure on one
    /// peer does not stop delivery to the others. Returns the number of
    /// peers the frame was handed to.
    pub fn send_data_to_all_peers<T: Serialize + ?Sized>(&self, data: &T) -> usize {
        let text = match serde_json::to_string(data) {
            Ok(t) => t,
            Err(e) => {
                sink_error!(self.logger, "[Data] cannot serialize broadcast payload: {e}");
                return 0;
            }
        };
        self.peers
            .ids()
            .iter()
            .filter(|id| self.send_text(id, &text))
            .count()
    }

    fn send_text(&self, peer_id: &str, text: &str) -> bool {
        let Some(dc) = self.peers.get(peer_id).and_then(PeerConnection::data_channel) else {
            sink_warn!(self.logger, "[Data] no data channel for {peer_id}, message dropped");
            return false;
        };
        if dc.ready_state() != DataChannelState::Open {
            sink_warn!(self.logger, "[Data] channel to {peer_id} not open, message dropped");
            return false;
        }
        match dc.send_text(text) {
            Ok(()) => true,
            Err(e) => {
                sink_error!(self.logger, "[Data] send to {peer_id} failed: {e}");
                false
            }
        }
    }

    // ---------------------------------------------------------------------
    // Screen share
    // ---------------------------------------------------------------------

    /// Starts display capture and swaps it in as the outgoing video on every
    /// peer, without renegotiating. Already sharing returns the active stream.
    ///
    /// # Errors
    /// `ScreenShare` if capture is refused or yields no video; an `error`
    /// event tagged `screen_share_start` is emitted and nothing changes.
    pub fn start_screen_share(&mut self) -> Result<MediaStream, CallError> {
        if self.destroyed {
            return Err(CallError::Destroyed);
        }
        if let Some(active) = self.media.screen().filter(|_| self.media.is_sharing()) {
            return Ok(active.clone());
        }

        let stream = match self.devices.get_display_media(&self.config.display) {
            Ok(s) => s,
            Err(e) => {
                self.report_error(ErrorType::ScreenShareStart, &e.to_string(), None);
                return Err(CallError::ScreenShare(e));
            }
        };
        let Some(screen_track) = stream.first_video_track().cloned() else {
            stream.stop_all();
            let e = MediaError::NotFound("display video track".into());
            self.report_error(ErrorType::ScreenShareStart, &e.to_string(), None);
            return Err(CallError::ScreenShare(e));
        };

        let tx = self.input_tx.clone();
        screen_track.on_ended(move |track| {
            let _ = tx.send(ManagerInput::LocalTrackEnded {
                track_id: track.id().to_owned(),
            });
        });

        for peer in self.peers.iter() {
            let Some(sender) = peer.video_sender() else {
                continue;
            };
            if let Err(e) = sender.replace_track(Some(screen_track.clone())) {
                sink_warn!(self.logger, "[Screen] replace track for {}: {e}", peer.peer_id());
            }
        }

        sink_info!(self.logger, "[Screen] sharing started ({})", stream.id());
        self.media.begin_share(stream.clone());
        self.emit(CallEvent::ScreenShareStarted(stream.clone()));

        // Capture that ended before the listener went in never calls it.
        if screen_track.ready_state() == TrackState::Ended {
            sink_warn!(self.logger, "[Screen] capture ended while starting");
            let _ = self.input_tx.send(ManagerInput::LocalTrackEnded {
                track_id: screen_track.id().to_owned(),
            });
        }
        Ok(stream)
    }

    /// Stops display capture and puts the camera track back on every peer.
    /// Best effort: a failing peer is reported and the rollback continues.
    pub fn stop_screen_share(&mut self) {
        if !self.media.is_sharing() {
            return;
        }
        if let Some(screen) = self.media.end_share() {
            screen.stop_all();
        }

        let mut failures = Vec::new();
        if let Some(camera) = self.media.camera_video_track().cloned() {
            for peer in self.peers.iter() {
                let Some(sender) = peer.video_sender() else {
                    continue;
                };
                if let Err(e) = sender.replace_track(Some(camera.clone())) {
                    failures.push((peer.peer_id().to_owned(), e));
                }
            }
        }
        for (peer_id, e) in failures {
            self.report_error(ErrorType::ScreenShareStop, &e.to_string(), Some(&peer_id));
        }

        sink_info!(self.logger, "[Screen] sharing stopped");
        self.emit(CallEvent::ScreenShareStopped);
    }

    // ---------------------------------------------------------------------
    // Statistics
    // ---------------------------------------------------------------------

    /// Polls one peer, or all of them, and returns the parsed snapshots.
    /// Does not emit `statsUpdate`.
    pub fn get_stats(&mut self, peer_id: Option<&str>) -> HashMap<String, ConnectionStats> {
        self.poll_stats(peer_id, false).0
    }

    /// Runs one stats cycle now: polls every peer, publishes the map as
    /// `statsUpdate` and adapts bitrates. Nothing happens without peers.
    pub fn collect_stats(&mut self) {
        if self.destroyed || self.peers.is_empty() {
            return;
        }
        let (stats, adjusted) = self.poll_stats(None, self.config.quality.adaptive_bitrate);
        self.latest_stats.clone_from(&stats);
        self.emit(CallEvent::StatsUpdate(stats));

        for (peer_id, bitrate_bps) in adjusted {
            sink_info!(self.logger, "[Quality] {peer_id}: target bitrate {bitrate_bps} bps");
            self.emit(CallEvent::BitrateAdjusted {
                peer_id,
                bitrate_bps,
            });
        }
    }

    /// Polls transports and, when `adapt` is set, feeds the quality
    /// controllers and caps senders. Returns the snapshots and every
    /// `(peer, bitrate)` change made.
    fn poll_stats(
        &mut self,
        only: Option<&str>,
        adapt: bool,
    ) -> (HashMap<String, ConnectionStats>, Vec<(String, u32)>) {
        let now = Instant::now();
        let mut out = HashMap::new();
        let mut adjusted = Vec::new();

        for peer in self.peers.iter_mut() {
            if only.is_some_and(|id| id != peer.peer_id()) {
                continue;
            }
            let report = match peer.transport().get_stats() {
                Ok(r) => r,
                Err(e) => {
                    sink_warn!(self.logger, "[Stats] {} unavailable: {e}", peer.peer_id());
                    continue;
                }
            };
            let (stats, metrics) = self.collector.record(peer.peer_id(), &report, now);
            sink_trace!(self.logger, "[Stats] {}: {stats:?}", peer.peer_id());

            if let Some(m) = metrics.filter(|_| adapt) {
                if let Some(bps) = peer.quality_mut().and_then(|qc| qc.on_network_metrics(&m)) {
                    if let Some(sender) = peer.video_sender() {
                        if let Err(e) = sender.set_max_bitrate(bps) {
                            sink_warn!(self.logger, "[Quality] {}: {e}", peer.peer_id());
                        }
                    }
                    adjusted.push((peer.peer_id().to_owned(), bps));
                }
            }
            out.insert(peer.peer_id().to_owned(), stats);
        }
        (out, adjusted)
    }

    // ---------------------------------------------------------------------
    // Event loop
    // ---------------------------------------------------------------------

    /// Applies every queued input without blocking. Returns how many were handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(input) = self.input_rx.try_recv() {
            self.handle_input(input);
            handled += 1;
        }
        handled
    }

    /// Waits up to `timeout` for the first input, then drains like [`poll`](Self::poll).
    pub fn poll_timeout(&mut self, timeout: Duration) -> usize {
        match self.input_rx.recv_timeout(timeout) {
            Ok(input) => {
                self.handle_input(input);
                1 + self.poll()
            }
            Err(_) => 0,
        }
    }

    fn handle_input(&mut self, input: ManagerInput) {
        if self.destroyed {
            return;
        }
        match input {
            ManagerInput::Peer {
                peer_id,
                generation,
                event,
            } => {
                if self.peers.is_current(&peer_id, generation) {
                    self.handle_peer_event(&peer_id, event);
                } else {
                    sink_trace!(
                        self.logger,
                        "[Peer] dropped {} from stale connection {peer_id}#{generation}",
                        event.name()
                    );
                }
            }
            ManagerInput::LocalTrackEnded { track_id } => {
                let is_screen = self
                    .media
                    .screen_video_track()
                    .is_some_and(|t| t.id() == track_id);
                if is_screen && self.media.is_sharing() {
                    sink_info!(self.logger, "[Screen] capture ended at the source");
                    self.stop_screen_share();
                }
            }
            ManagerInput::StatsTick => self.collect_stats(),
        }
    }

    fn handle_peer_event(&mut self, peer_id: &str, event: PeerEvent) {
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return;
        };
        let id = peer_id.to_owned();
        match event {
            PeerEvent::IceCandidate(Some(candidate)) => {
                self.emit(CallEvent::IceCandidate {
                    peer_id: id,
                    candidate,
                });
            }
            PeerEvent::IceCandidate(None) => {
                sink_debug!(self.logger, "[Signal] {peer_id}: candidate gathering complete");
            }
            PeerEvent::Track { track, streams } => {
                sink_info!(
                    self.logger,
                    "[Peer] {peer_id}: remote {} track {}",
                    track.kind().as_str(),
                    track.id()
                );
                let stream = peer.add_remote_track(track, streams);
                self.emit(CallEvent::RemoteStreamReceived {
                    peer_id: id,
                    stream,
                });
            }
            PeerEvent::ConnectionStateChange(state) => {
                peer.set_connection_state(state);
                sink_info!(self.logger, "[Peer] {peer_id}: connection {}", state.as_str());
                self.emit(CallEvent::ConnectionStateChange { peer_id: id, state });
                if matches!(state, ConnectionState::Failed | ConnectionState::Disconnected) {
                    self.teardown_peer(peer_id);
                }
            }
            PeerEvent::IceConnectionStateChange(state) => {
                peer.set_ice_connection_state(state);
                sink_debug!(self.logger, "[Peer] {peer_id}: ICE {}", state.as_str());
                self.emit(CallEvent::IceConnectionStateChange { peer_id: id, state });
            }
            PeerEvent::NegotiationNeeded => self.send_offer(peer_id),
            PeerEvent::DataChannel(channel) => {
                if peer.is_initiator() {
                    sink_debug!(
                        self.logger,
                        "[Data] {peer_id}: ignoring inbound channel {} on initiator side",
                        channel.label()
                    );
                    return;
                }
                sink_debug!(self.logger, "[Data] {peer_id}: accepted channel {}", channel.label());
                peer.set_data_channel(channel);
            }
            PeerEvent::DataChannelOpen { label } => {
                if peer.data_channel().is_some_and(|dc| dc.label() == label) {
                    sink_info!(self.logger, "[Data] channel to {peer_id} open");
                    self.emit(CallEvent::DataChannelOpen { peer_id: id });
                }
            }
            PeerEvent::DataChannelMessage { label, text } => {
                match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(data) => self.emit(CallEvent::DataChannelMessage { peer_id: id, data }),
                    Err(e) => {
                        sink_warn!(
                            self.logger,
                            "[Data] malformed JSON from {peer_id} on {label}: {e}"
                        );
                    }
                }
            }
            PeerEvent::DataChannelError { label, message } => {
                self.report_error(
                    ErrorType::DataChannel,
                    &format!("{label}: {message}"),
                    Some(peer_id),
                );
            }
            PeerEvent::DataChannelClose { label } => {
                sink_info!(self.logger, "[Data] channel {label} to {peer_id} closed");
            }
        }
    }

    // ---------------------------------------------------------------------
    // Teardown
    // ---------------------------------------------------------------------

    /// Stops the stats timer, closes every peer, releases local media, emits
    /// `destroyed` and removes all listeners. Later calls do nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
        for mut peer in self.peers.drain() {
            peer.close();
        }
        self.media.release();
        self.latest_stats.clear();
        self.collector.clear();
        while self.input_rx.try_recv().is_ok() {}

        sink_info!(self.logger, "[Peer] session {} destroyed", self.session.session_id());
        self.bus.emit(&CallEvent::Destroyed);
        self.bus.remove_all();
    }

    fn emit(&mut self, event: CallEvent) {
        self.bus.emit(&event);
    }

    fn report_error(&mut self, error_type: ErrorType, message: &str, peer_id: Option<&str>) {
        match peer_id {
            Some(id) => sink_error!(self.logger, "[{error_type}] {id}: {message}"),
            None => sink_error!(self.logger, "[{error_type}] {message}"),
        }
        self.emit(CallEvent::Error {
            error_type,
            message: message.to_owned(),
            peer_id: peer_id.map(str::to_owned),
        });
    }
}

impl Drop for CallManager {
    fn drop(&mut self) {
        self.destroy();
    }
}

