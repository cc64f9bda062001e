#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::{
    sync::{Arc, mpsc::Receiver},
    time::Duration,
};

use meshcall::{
    CallConfig, CallEvent, CallManager, EventKind, Session,
    log::MemoryLogSink,
    loopback::{LoopbackDevices, LoopbackNetwork},
};

/// One manager plus everything it emitted so far.
pub struct Participant {
    pub name: &'static str,
    pub manager: CallManager,
    pub devices: LoopbackDevices,
    pub log: Arc<MemoryLogSink>,
    events: Receiver<CallEvent>,
    pub seen: Vec<CallEvent>,
}

/// Default config with the stats timer pushed out of the way so tests
/// drive stats cycles by hand.
pub fn quiet_config() -> CallConfig {
    CallConfig {
        stats_interval: Duration::from_secs(3600),
        ..CallConfig::default()
    }
}

impl Participant {
    pub fn new(net: &LoopbackNetwork, name: &'static str) -> Self {
        Self::with_config(net, name, quiet_config())
    }

    pub fn with_config(net: &LoopbackNetwork, name: &'static str, config: CallConfig) -> Self {
        let devices = LoopbackDevices::new();
        let log = Arc::new(MemoryLogSink::new());
        let mut manager = CallManager::new(
            Session::new("room", name),
            config,
            Box::new(devices.clone()),
            Box::new(net.factory(name)),
            log.clone(),
        );
        let events = manager.subscribe(None);
        Self {
            name,
            manager,
            devices,
            log,
            events,
            seen: Vec::new(),
        }
    }

    /// Moves pending events into `seen` and returns the new ones.
    pub fn drain(&mut self) -> Vec<CallEvent> {
        let fresh: Vec<_> = self.events.try_iter().collect();
        self.seen.extend(fresh.iter().cloned());
        fresh
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.seen.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.seen.iter().map(CallEvent::name).collect()
    }

    pub fn forget_seen(&mut self) {
        self.seen.clear();
    }
}

/// Forwards `from`'s signaling events to `to`, addressed by participant name.
fn relay(from: &mut Participant, to: &mut Participant) -> usize {
    let fresh = from.drain();
    for event in &fresh {
        match event {
            CallEvent::Offer { offer, .. } => to.manager.handle_offer(from.name, offer.clone()),
            CallEvent::Answer { answer, .. } => to.manager.handle_answer(from.name, answer.clone()),
            CallEvent::IceCandidate { candidate, .. } => {
                to.manager.handle_ice_candidate(from.name, candidate.clone());
            }
            _ => {}
        }
    }
    fresh.len()
}

/// Polls both sides and relays signaling until both are idle.
pub fn pump(a: &mut Participant, b: &mut Participant) {
    for _ in 0..50 {
        let mut moved = a.manager.poll() + b.manager.poll();
        moved += relay(a, b);
        moved += relay(b, a);
        if moved == 0 {
            return;
        }
    }
    panic!("signaling between {} and {} never settled", a.name, b.name);
}

/// Both sides with local media, `a` calling `b`, fully connected.
pub fn connected_pair(net: &LoopbackNetwork) -> (Participant, Participant) {
    let mut a = Participant::new(net, "alice");
    let mut b = Participant::new(net, "bob");
    a.manager.acquire_local_stream(None).unwrap();
    b.manager.acquire_local_stream(None).unwrap();
    a.manager.create_peer_connection("bob", "bob", true).unwrap();
    b.manager.create_peer_connection("alice", "alice", false).unwrap();
    pump(&mut a, &mut b);
    (a, b)
}
