use std::sync::Arc;

use crate::{
    loopback::{
        loopback_channel::LoopbackChannel,
        loopback_network::LoopbackNetwork,
        loopback_sender::LoopbackSender,
        sdp::{build_sdp, host_candidate, is_candidate, parse_endpoint},
    },
    media::{MediaStream, TrackRef},
    stats::StatsReport,
    transport::{
        ConnectionState, DataChannel, DataChannelInit, IceCandidate, IceConnectionState,
        PeerEvent, PeerTransport, RtpSender, SdpType, SessionDescription, TransportConfig,
        TransportError, TransportFactory, transport_event::PeerEventSink,
    },
};

/// Creates loopback transports for one session.
pub struct LoopbackFactory {
    net: LoopbackNetwork,
    session_id: String,
}

impl LoopbackFactory {
    pub(crate) const fn new(net: LoopbackNetwork, session_id: String) -> Self {
        Self { net, session_id }
    }
}

impl TransportFactory for LoopbackFactory {
    fn create(
        &self,
        _config: &TransportConfig,
        events: PeerEventSink,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let id = self.net.register(self.session_id.clone(), events)?;
        Ok(Box::new(LoopbackTransport {
            net: self.net.clone(),
            id,
        }))
    }
}

/// A peer connection whose far end is another loopback transport in the
/// same process.
pub struct LoopbackTransport {
    net: LoopbackNetwork,
    id: u64,
}

impl LoopbackTransport {
    #[must_use]
    pub const fn endpoint_id(&self) -> u64 {
        self.id
    }

    fn describe(&self, sdp_type: SdpType) -> Result<SessionDescription, TransportError> {
        let mut st = self.net.lock();
        if sdp_type == SdpType::Offer && st.refuse_offers {
            return Err(TransportError::Backend("loopback network is refusing offers".into()));
        }
        let ep = st.endpoint_mut(self.id)?;
        let kinds: Vec<_> = ep
            .senders
            .iter()
            .filter_map(|s| s.track().map(|t| t.kind()))
            .collect();
        let sdp = build_sdp(self.id, &kinds, !ep.channels.is_empty());
        ep.negotiation_pending = false;
        Ok(SessionDescription { sdp_type, sdp })
    }
}

impl PeerTransport for LoopbackTransport {
    fn add_track(
        &mut self,
        track: &TrackRef,
        _stream: &MediaStream,
    ) -> Result<Arc<dyn RtpSender>, TransportError> {
        let mut st = self.net.lock();
        let ep = st.endpoint_mut(self.id)?;
        let sender = Arc::new(LoopbackSender::new(track.clone()));
        ep.senders.push(sender.clone());
        ep.request_negotiation();
        Ok(sender)
    }

    fn senders(&self) -> Vec<Arc<dyn RtpSender>> {
        let st = self.net.lock();
        st.endpoints.get(&self.id).map_or_else(Vec::new, |ep| {
            ep.senders
                .iter()
                .map(|s| s.clone() as Arc<dyn RtpSender>)
                .collect()
        })
    }

    fn create_data_channel(
        &mut self,
        label: &str,
        init: DataChannelInit,
    ) -> Result<Arc<dyn DataChannel>, TransportError> {
        if label.is_empty() {
            return Err(TransportError::DataChannel("empty label".into()));
        }
        let mut st = self.net.lock();
        let ep = st.endpoint_mut(self.id)?;
        let channel = Arc::new(LoopbackChannel::new(label, init, ep.sink.clone()));
        ep.channels.push(channel.clone());
        ep.request_negotiation();
        Ok(channel)
    }

    fn create_offer(&mut self) -> Result<SessionDescription, TransportError> {
        self.describe(SdpType::Offer)
    }

    fn create_answer(&mut self) -> Result<SessionDescription, TransportError> {
        {
            let mut st = self.net.lock();
            let ep = st.endpoint_mut(self.id)?;
            if !ep.remote.as_ref().is_some_and(|r| r.sdp_type == SdpType::Offer) {
                return Err(TransportError::Sdp("no remote offer to answer".into()));
            }
        }
        self.describe(SdpType::Answer)
    }

    fn set_local_description(&mut self, desc: SessionDescription) -> Result<(), TransportError> {
        let mut st = self.net.lock();
        let ep = st.endpoint_mut(self.id)?;
        if parse_endpoint(&desc.sdp) != Some(self.id) {
            return Err(TransportError::Sdp("description was not created here".into()));
        }
        if desc.sdp_type == SdpType::Answer
            && !ep.remote.as_ref().is_some_and(|r| r.sdp_type == SdpType::Offer)
        {
            return Err(TransportError::InvalidState("answer without remote offer".into()));
        }
        ep.local = Some(desc);
        if !ep.gathered {
            ep.gathered = true;
            ep.sink.emit(PeerEvent::IceCandidate(Some(IceCandidate {
                candidate: host_candidate(self.id),
                sdp_mid: Some("0".into()),
                sdp_m_line_index: Some(0),
            })));
            ep.sink.emit(PeerEvent::IceCandidate(None));
        }
        st.try_connect(self.id);
        Ok(())
    }

    fn set_remote_description(&mut self, desc: SessionDescription) -> Result<(), TransportError> {
        let remote_id = parse_endpoint(&desc.sdp)
            .ok_or_else(|| TransportError::Sdp("missing x-loopback-endpoint attribute".into()))?;
        if remote_id == self.id {
            return Err(TransportError::Sdp("description refers to this endpoint".into()));
        }

        let mut st = self.net.lock();
        if !st.endpoints.contains_key(&remote_id) {
            return Err(TransportError::Sdp(format!("unknown loopback endpoint {remote_id}")));
        }
        let ep = st.endpoint_mut(self.id)?;
        let have_local_offer = ep.local.as_ref().is_some_and(|l| l.sdp_type == SdpType::Offer);
        match desc.sdp_type {
            SdpType::Offer if have_local_offer && !ep.connected => {
                return Err(TransportError::InvalidState("have-local-offer".into()));
            }
            SdpType::Answer if !have_local_offer => {
                return Err(TransportError::InvalidState("no local offer to answer".into()));
            }
            SdpType::Pranswer | SdpType::Rollback => {
                return Err(TransportError::Sdp(format!("unsupported type {:?}", desc.sdp_type)));
            }
            _ => {}
        }
        ep.remote = Some(desc);
        ep.remote_endpoint = Some(remote_id);
        st.try_connect(self.id);
        Ok(())
    }

    fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<(), TransportError> {
        let mut st = self.net.lock();
        let ep = st.endpoint_mut(self.id)?;
        if ep.remote.is_none() {
            return Err(TransportError::InvalidState("remote description not set".into()));
        }
        if !is_candidate(&candidate.candidate) {
            return Err(TransportError::IceCandidate(format!(
                "malformed candidate {:?}",
                candidate.candidate
            )));
        }
        ep.remote_candidate_applied = true;
        st.try_connect(self.id);
        Ok(())
    }

    fn get_stats(&self) -> Result<StatsReport, TransportError> {
        self.net.lock().stats(self.id)
    }

    fn connection_state(&self) -> ConnectionState {
        self.net
            .lock()
            .endpoints
            .get(&self.id)
            .map_or(ConnectionState::Closed, |ep| ep.state)
    }

    fn ice_connection_state(&self) -> IceConnectionState {
        self.net
            .lock()
            .endpoints
            .get(&self.id)
            .map_or(IceConnectionState::Closed, |ep| ep.ice_state)
    }

    fn close(&mut self) {
        let channels = self.net.lock().close(self.id);
        for channel in channels {
            channel.close();
        }
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        self.close();
    }
}
