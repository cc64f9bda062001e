#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Participant, connected_pair, pump};
use meshcall::{
    CallError, CallEvent, EventKind,
    core::ErrorType,
    log::LogLevel,
    loopback::LoopbackNetwork,
    media::{MediaError, MediaTrack, TrackState},
    transport::{ConnectionState, DataChannel, IceCandidate, RtpSender, SessionDescription},
};
use serde_json::json;

fn connection_states(p: &Participant, peer: &str) -> Vec<ConnectionState> {
    p.seen
        .iter()
        .filter_map(|e| match e {
            CallEvent::ConnectionStateChange { peer_id, state } if peer_id == peer => Some(*state),
            _ => None,
        })
        .collect()
}

fn errors(p: &Participant) -> Vec<(ErrorType, Option<String>)> {
    p.seen
        .iter()
        .filter_map(|e| match e {
            CallEvent::Error { error_type, peer_id, .. } => Some((*error_type, peer_id.clone())),
            _ => None,
        })
        .collect()
}

fn candidate(line: &str) -> IceCandidate {
    IceCandidate {
        candidate: line.to_owned(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    }
}

fn bob() -> Option<String> {
    Some("bob".to_owned())
}

#[test]
fn initiator_offers_before_sending_candidates() {
    let net = LoopbackNetwork::new();
    let (a, b) = connected_pair(&net);

    let names = a.names();
    let offer = names.iter().position(|n| *n == "offer").unwrap();
    let candidate = names.iter().position(|n| *n == "iceCandidate").unwrap();
    assert!(offer < candidate, "{names:?}");
    assert_eq!(a.count(EventKind::Offer), 1);
    assert_eq!(b.count(EventKind::Answer), 1);
    assert_eq!(b.count(EventKind::Offer), 0);
}

#[test]
fn both_sides_reach_connected_with_media_and_channel() {
    let net = LoopbackNetwork::new();
    let (a, b) = connected_pair(&net);

    assert_eq!(
        connection_states(&a, "bob"),
        vec![ConnectionState::Connecting, ConnectionState::Connected]
    );
    assert_eq!(
        connection_states(&b, "alice"),
        vec![ConnectionState::Connecting, ConnectionState::Connected]
    );

    let peer = a.manager.peer("bob").unwrap();
    assert_eq!(peer.connection_state(), ConnectionState::Connected);
    assert!(peer.has_open_channel());
    let remote = peer.remote_stream().unwrap();
    assert_eq!(remote.tracks().len(), 2);

    assert_eq!(a.count(EventKind::RemoteStreamReceived), 2);
    assert_eq!(a.count(EventKind::DataChannelOpen), 1);
    assert_eq!(b.count(EventKind::DataChannelOpen), 1);
    assert!(b.manager.peer("alice").unwrap().has_open_channel());
}

#[test]
fn data_messages_arrive_as_equal_json() {
    let net = LoopbackNetwork::new();
    let (mut a, mut b) = connected_pair(&net);
    a.forget_seen();
    b.forget_seen();

    let payload = json!({ "type": "chat", "body": { "text": "hi", "n": [1, 2, 3] } });
    assert!(a.manager.send_data_to_peer("bob", &payload));
    assert_eq!(b.manager.send_data_to_all_peers(&json!("pong")), 1);
    pump(&mut a, &mut b);

    let received: Vec<_> = b
        .seen
        .iter()
        .filter_map(|e| match e {
            CallEvent::DataChannelMessage { peer_id, data } => Some((peer_id.clone(), data.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(received, vec![("alice".to_owned(), payload)]);
    assert!(a.seen.iter().any(|e| matches!(
        e,
        CallEvent::DataChannelMessage { data, .. } if *data == json!("pong")
    )));
}

#[test]
fn sending_without_open_channel_is_dropped() {
    let net = LoopbackNetwork::new();
    let mut a = Participant::new(&net, "alice");
    a.manager.create_peer_connection("bob", "bob", true).unwrap();

    assert!(!a.manager.send_data_to_peer("bob", &json!({})));
    assert!(!a.manager.send_data_to_peer("nobody", &json!({})));
    assert_eq!(a.manager.send_data_to_all_peers(&json!({})), 0);
    assert!(a.log.contains(LogLevel::Warn, "not open"));
}

#[test]
fn signaling_for_unknown_peer_is_ignored() {
    let net = LoopbackNetwork::new();
    let mut a = Participant::new(&net, "alice");
    a.manager.handle_offer("ghost", SessionDescription::offer("v=0"));
    a.manager.handle_answer("ghost", SessionDescription::answer("v=0"));
    a.manager.poll();

    assert!(a.drain().is_empty());
    assert!(a.log.contains(LogLevel::Warn, "unknown peer ghost"));
}

#[test]
fn recreating_a_peer_replaces_it() {
    let net = LoopbackNetwork::new();
    let mut a = Participant::new(&net, "alice");
    a.manager.acquire_local_stream(None).unwrap();
    let first = a.manager.create_peer_connection("bob", "bob", true).unwrap();
    let old_generation = a.manager.peer("bob").unwrap().generation();
    let second = a.manager.create_peer_connection("bob", "bob-2", true).unwrap();
    a.manager.poll();
    a.drain();

    assert_eq!(first.peer_id, second.peer_id);
    assert_eq!(a.manager.peer_count(), 1);
    assert_eq!(a.manager.peer("bob").unwrap().user_id(), "bob-2");
    assert_ne!(a.manager.peer("bob").unwrap().generation(), old_generation);
    assert_eq!(net.endpoint_count(), 1);
    assert_eq!(a.count(EventKind::PeerConnected), 2);
    assert_eq!(a.count(EventKind::PeerDisconnected), 0);
    // The replaced connection's negotiation request is stale.
    assert_eq!(a.count(EventKind::Offer), 1);
}

#[test]
fn removing_a_peer_disconnects_both_sides() {
    let net = LoopbackNetwork::new();
    let (mut a, mut b) = connected_pair(&net);

    assert!(a.manager.remove_peer("bob"));
    assert!(!a.manager.remove_peer("bob"));
    pump(&mut a, &mut b);

    assert_eq!(a.count(EventKind::PeerDisconnected), 1);
    assert_eq!(b.count(EventKind::PeerDisconnected), 1);
    assert_eq!(connection_states(&b, "alice").last(), Some(&ConnectionState::Disconnected));
    assert_eq!(b.manager.peer_count(), 0);
    assert_eq!(net.endpoint_count(), 0);
}

#[test]
fn failed_transport_tears_peer_down() {
    let net = LoopbackNetwork::new();
    let (mut a, _b) = connected_pair(&net);

    assert!(net.fail_peer("alice", "bob"));
    a.manager.poll();
    a.drain();

    assert_eq!(connection_states(&a, "bob").last(), Some(&ConnectionState::Failed));
    assert_eq!(a.count(EventKind::PeerDisconnected), 1);
    assert!(a.manager.peer("bob").is_none());
    assert!(!net.fail_peer("alice", "bob"));
}

#[test]
fn toggles_without_stream_do_nothing() {
    let net = LoopbackNetwork::new();
    let mut a = Participant::new(&net, "alice");

    assert!(!a.manager.toggle_audio(None));
    assert!(!a.manager.toggle_video(Some(true)));
    assert!(a.drain().is_empty());
}

#[test]
fn toggles_flip_local_tracks() {
    let net = LoopbackNetwork::new();
    let mut a = Participant::new(&net, "alice");
    let stream = a.manager.acquire_local_stream(None).unwrap();

    assert!(!a.manager.toggle_video(Some(false)));
    assert!(!stream.first_video_track().unwrap().is_enabled());
    assert!(a.manager.toggle_video(None));
    assert!(!a.manager.toggle_audio(None));
    a.drain();

    let toggles: Vec<_> = a
        .seen
        .iter()
        .filter_map(|e| match e {
            CallEvent::VideoToggled { enabled } => Some(("video", *enabled)),
            CallEvent::AudioToggled { enabled } => Some(("audio", *enabled)),
            _ => None,
        })
        .collect();
    assert_eq!(toggles, vec![("video", false), ("video", true), ("audio", false)]);
}

#[test]
fn denied_camera_reports_media_access() {
    let net = LoopbackNetwork::new();
    let mut a = Participant::new(&net, "alice");
    a.devices.set_camera_denied(true);

    let err = a.manager.acquire_local_stream(None).unwrap_err();
    assert_eq!(err, CallError::MediaAccess(MediaError::PermissionDenied));
    assert!(a.manager.local_stream().is_none());
    a.drain();
    assert!(a.seen.iter().any(|e| matches!(
        e,
        CallEvent::Error { error_type: ErrorType::MediaAccess, peer_id: None, .. }
    )));
    assert_eq!(a.count(EventKind::LocalStreamReady), 0);
}

#[test]
fn refused_transport_reports_peer_creation() {
    let net = LoopbackNetwork::new();
    let mut a = Participant::new(&net, "alice");
    net.set_refuse_connections(true);

    let err = a.manager.create_peer_connection("bob", "bob", true).unwrap_err();
    assert!(matches!(err, CallError::Transport(_)));
    assert_eq!(a.manager.peer_count(), 0);
    a.drain();
    assert!(a.seen.iter().any(|e| matches!(
        e,
        CallEvent::Error { error_type: ErrorType::PeerCreation, peer_id: Some(id), .. } if id == "bob"
    )));
    assert_eq!(a.count(EventKind::PeerConnected), 0);
}

#[test]
fn destroy_is_final_and_idempotent() {
    let net = LoopbackNetwork::new();
    let (mut a, mut b) = connected_pair(&net);
    let stream = a.manager.local_stream().cloned().unwrap();
    a.forget_seen();

    a.manager.destroy();
    a.manager.destroy();
    a.drain();

    assert_eq!(a.names(), vec!["destroyed"]);
    assert!(a.manager.is_destroyed());
    assert_eq!(a.manager.peer_count(), 0);
    assert!(a.manager.local_stream().is_none());
    assert!(stream.tracks().iter().all(|t| t.ready_state() == TrackState::Ended));
    assert_eq!(
        a.manager.create_peer_connection("carol", "carol", true).unwrap_err(),
        CallError::Destroyed
    );

    b.manager.poll();
    b.drain();
    assert_eq!(b.count(EventKind::PeerDisconnected), 1);
    assert_eq!(net.endpoint_count(), 0);
}

#[test]
fn reacquiring_media_moves_peers_to_the_new_tracks() {
    let net = LoopbackNetwork::new();
    let (mut a, _b) = connected_pair(&net);
    let old = a.manager.local_stream().cloned().unwrap();

    let fresh = a.manager.acquire_local_stream(None).unwrap();
    let pc = a.manager.peer("bob").unwrap();
    let sent: Vec<_> = pc.transport().senders().iter().filter_map(|s| s.track()).collect();
    assert_eq!(sent.len(), 2);
    for track in &sent {
        assert!(fresh.tracks().iter().any(|t| MediaTrack::same(t, track)));
        assert_eq!(track.ready_state(), TrackState::Live);
    }
    assert_eq!(pc.local_stream().map(|s| s.id().to_owned()), Some(fresh.id().to_owned()));
    assert!(old.tracks().iter().all(|t| t.ready_state() == TrackState::Ended));

    assert!(!a.manager.toggle_video(Some(false)));
    let video = a.manager.peer("bob").and_then(|pc| pc.video_sender()).unwrap();
    assert!(!video.track().unwrap().is_enabled());
    // No renegotiation for a same-kind swap.
    a.forget_seen();
    a.manager.poll();
    a.drain();
    assert_eq!(a.count(EventKind::Offer), 0);
}

#[test]
fn malformed_offer_reports_offer_handling() {
    let net = LoopbackNetwork::new();
    let (mut a, _b) = connected_pair(&net);
    a.forget_seen();

    a.manager.handle_offer("bob", SessionDescription::offer("v=0"));
    a.drain();
    assert_eq!(errors(&a), vec![(ErrorType::OfferHandling, bob())]);
    assert_eq!(a.count(EventKind::Answer), 0);
}

#[test]
fn answer_without_local_offer_reports_answer_handling() {
    let net = LoopbackNetwork::new();
    let (a, mut b) = connected_pair(&net);
    let alice_sdp = a
        .seen
        .iter()
        .find_map(|e| match e {
            CallEvent::Offer { offer, .. } => Some(offer.sdp.clone()),
            _ => None,
        })
        .unwrap();
    b.forget_seen();

    // Bob answered; he holds no offer of his own.
    b.manager.handle_answer("alice", SessionDescription::answer(alice_sdp));
    b.drain();
    assert_eq!(
        errors(&b),
        vec![(ErrorType::AnswerHandling, Some("alice".to_owned()))]
    );
    assert_eq!(b.manager.peer("alice").unwrap().connection_state(), ConnectionState::Connected);
}

#[test]
fn candidate_before_remote_description_reports_ice_candidate() {
    let net = LoopbackNetwork::new();
    let mut a = Participant::new(&net, "alice");
    a.manager.create_peer_connection("bob", "bob", true).unwrap();
    a.manager.poll();
    a.drain();
    a.forget_seen();

    a.manager
        .handle_ice_candidate("bob", candidate("candidate:1 1 udp 2130706431 127.0.0.1 9 typ host"));
    a.drain();
    assert_eq!(errors(&a), vec![(ErrorType::IceCandidate, bob())]);
}

#[test]
fn malformed_candidate_reports_ice_candidate() {
    let net = LoopbackNetwork::new();
    let (mut a, _b) = connected_pair(&net);
    a.forget_seen();

    a.manager.handle_ice_candidate("bob", candidate("not a candidate"));
    a.drain();
    assert_eq!(errors(&a), vec![(ErrorType::IceCandidate, bob())]);
    assert_eq!(a.manager.peer_count(), 1);
}

#[test]
fn refused_offer_reports_offer_creation() {
    let net = LoopbackNetwork::new();
    let mut a = Participant::new(&net, "alice");
    a.manager.acquire_local_stream(None).unwrap();
    net.set_refuse_offers(true);

    a.manager.create_peer_connection("bob", "bob", true).unwrap();
    a.manager.poll();
    a.drain();
    assert_eq!(errors(&a), vec![(ErrorType::OfferCreation, bob())]);
    assert_eq!(a.count(EventKind::Offer), 0);
    assert_eq!(a.count(EventKind::IceCandidate), 0);
}

#[test]
fn malformed_inbound_json_is_logged_not_emitted() {
    let net = LoopbackNetwork::new();
    let (mut a, mut b) = connected_pair(&net);
    a.forget_seen();
    b.forget_seen();

    let channel = b.manager.peer("alice").and_then(|pc| pc.data_channel()).cloned().unwrap();
    channel.send_text("{not json").unwrap();
    pump(&mut a, &mut b);

    assert_eq!(a.count(EventKind::DataChannelMessage), 0);
    assert!(errors(&a).is_empty());
    assert!(a.log.contains(LogLevel::Warn, "malformed JSON from bob"));
}
