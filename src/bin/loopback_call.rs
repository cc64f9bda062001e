use std::{
    env,
    sync::{Arc, mpsc::Receiver},
    time::Duration,
};

use meshcall::{
    CallConfig, CallEvent, CallManager, Session,
    config::Config,
    log::{LogSink, logger::Logger},
    loopback::{LoopbackDevices, LoopbackNetwork},
};
use serde_json::json;

const DEFAULT_CONFIG_PATH: &str = "meshcall.conf";
const PUMP_ROUNDS: usize = 50;
const PUMP_WAIT: Duration = Duration::from_millis(10);

/// Two participants in one process, wired through the loopback network.
/// Signaling is relayed by hand: whatever one side emits as an offer,
/// answer or candidate is fed to the other.
fn main() {
    // --- Load config -------------------------------------------------------
    //
    //   loopback_call              -> ./meshcall.conf if present, else defaults
    //   loopback_call my.conf      -> my.conf
    let path = env::args().nth(1);
    let config = match path.as_deref() {
        Some(p) => Config::load(p).unwrap_or_else(|e| {
            eprintln!("[loopback_call] cannot read {p}: {e}, using defaults");
            Config::empty()
        }),
        None => Config::load(DEFAULT_CONFIG_PATH).unwrap_or_else(|_| Config::empty()),
    };

    // --- Start process logger ----------------------------------------------
    let logger = Logger::start(1024, 128, 10, &config);
    let log_sink: Arc<dyn LogSink> = Arc::new(logger.handle());
    eprintln!("[loopback_call] logging to {}", logger.file_path().display());

    let call_config = CallConfig::from_config(&config);
    let net = LoopbackNetwork::new();
    let devices = LoopbackDevices::new();

    let mut alice = CallManager::new(
        Session::new("room-1", "alice"),
        call_config.clone(),
        Box::new(devices.clone()),
        Box::new(net.factory("alice")),
        log_sink.clone(),
    );
    let mut bob = CallManager::new(
        Session::new("room-1", "bob"),
        call_config,
        Box::new(devices),
        Box::new(net.factory("bob")),
        log_sink,
    );
    let alice_events = alice.subscribe(None);
    let bob_events = bob.subscribe(None);

    for (name, manager) in [("alice", &mut alice), ("bob", &mut bob)] {
        if let Err(e) = manager.acquire_local_stream(None) {
            eprintln!("[{name}] no local media: {e}");
        }
    }

    // Alice starts the call; Bob waits for her offer.
    let created = alice
        .create_peer_connection("bob", "bob", true)
        .and_then(|_| bob.create_peer_connection("alice", "alice", false));
    if let Err(e) = created {
        eprintln!("[loopback_call] cannot create peers: {e}");
        return;
    }
    pump(&mut alice, &alice_events, &mut bob, &bob_events);

    alice.send_data_to_peer("bob", &json!({ "type": "chat", "text": "hello bob" }));
    bob.send_data_to_all_peers(&json!({ "type": "chat", "text": "hi alice" }));
    pump(&mut alice, &alice_events, &mut bob, &bob_events);

    match alice.start_screen_share() {
        Ok(stream) => println!("[alice] sharing screen as stream {}", stream.id()),
        Err(e) => println!("[alice] screen share failed: {e}"),
    }
    alice.stop_screen_share();
    alice.toggle_audio(Some(false));
    alice.collect_stats();
    bob.collect_stats();
    pump(&mut alice, &alice_events, &mut bob, &bob_events);

    alice.destroy();
    bob.destroy();
    pump(&mut alice, &alice_events, &mut bob, &bob_events);

    // Managers hold logger handles; release them before the writer joins.
    drop(alice);
    drop(bob);
    logger.shutdown();
}

/// Polls both managers and relays signaling until nothing moves or the
/// round limit is hit.
fn pump(
    alice: &mut CallManager,
    alice_events: &Receiver<CallEvent>,
    bob: &mut CallManager,
    bob_events: &Receiver<CallEvent>,
) {
    for _ in 0..PUMP_ROUNDS {
        let mut moved = alice.poll_timeout(PUMP_WAIT) + bob.poll_timeout(PUMP_WAIT);
        moved += relay("alice", alice_events, bob);
        moved += relay("bob", bob_events, alice);
        if moved == 0 {
            break;
        }
    }
}

/// Prints each event `from` emitted and forwards signaling to `to`.
fn relay(from: &str, events: &Receiver<CallEvent>, to: &mut CallManager) -> usize {
    let mut count = 0;
    while let Ok(event) = events.try_recv() {
        count += 1;
        match event {
            CallEvent::Offer { offer, .. } => {
                println!("[{from}] offer");
                to.handle_offer(from, offer);
            }
            CallEvent::Answer { answer, .. } => {
                println!("[{from}] answer");
                to.handle_answer(from, answer);
            }
            CallEvent::IceCandidate { candidate, .. } => {
                println!("[{from}] candidate {}", candidate.candidate);
                to.handle_ice_candidate(from, candidate);
            }
            CallEvent::DataChannelMessage { peer_id, data } => {
                println!("[{from}] message from {peer_id}: {data}");
            }
            CallEvent::StatsUpdate(stats) => {
                for (peer_id, s) in &stats {
                    println!(
                        "[{from}] stats {peer_id}: latency {:.0} ms, loss {:.1}%, quality {:?}",
                        s.latency, s.packet_loss, s.video_quality
                    );
                }
            }
            other => println!("[{from}] {}", other.name()),
        }
    }
    count
}
