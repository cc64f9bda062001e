use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::transport::{
    DataChannel, DataChannelInit, DataChannelState, PeerEvent, PeerEventSink, TransportError,
};

struct ChannelState {
    ready: DataChannelState,
    /// The paired end, set once connected.
    remote: Option<Weak<LoopbackChannel>>,
}

/// One end of an in-process data channel. Text goes straight to the paired
/// end's event sink, so per-channel order is the send order.
pub struct LoopbackChannel {
    label: String,
    init: DataChannelInit,
    local: PeerEventSink,
    state: Mutex<ChannelState>,
}

impl LoopbackChannel {
    pub(crate) fn new(label: impl Into<String>, init: DataChannelInit, local: PeerEventSink) -> Self {
        Self {
            label: label.into(),
            init,
            local,
            state: Mutex::new(ChannelState {
                ready: DataChannelState::Connecting,
                remote: None,
            }),
        }
    }

    #[must_use]
    pub const fn init(&self) -> DataChannelInit {
        self.init
    }

    pub(crate) fn is_paired(&self) -> bool {
        self.lock().remote.is_some()
    }

    /// Links `a` and `b` and opens both, announcing `open` on each side.
    pub(crate) fn pair(a: &Arc<Self>, b: &Arc<Self>) {
        for (this, other) in [(a, b), (b, a)] {
            let mut st = this.lock();
            st.remote = Some(Arc::downgrade(other));
            st.ready = DataChannelState::Open;
        }
        a.announce_open();
        b.announce_open();
    }

    /// Sent to the accepting side before `open`.
    pub(crate) fn announce_inbound(self: &Arc<Self>) {
        self.local.emit(PeerEvent::DataChannel(self.clone()));
    }

    fn announce_open(&self) {
        self.local.emit(PeerEvent::DataChannelOpen {
            label: self.label.clone(),
        });
    }

    /// Marks this end closed. Returns the paired end if it was still linked.
    fn shut(&self) -> Option<Option<Arc<Self>>> {
        let mut st = self.lock();
        if st.ready == DataChannelState::Closed {
            return None;
        }
        st.ready = DataChannelState::Closed;
        Some(st.remote.take().and_then(|w| w.upgrade()))
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DataChannel for LoopbackChannel {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn ready_state(&self) -> DataChannelState {
        self.lock().ready
    }

    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        let remote = {
            let st = self.lock();
            if st.ready != DataChannelState::Open {
                return Err(TransportError::DataChannel(format!("{} is not open", self.label)));
            }
            st.remote.as_ref().and_then(Weak::upgrade)
        };
        let Some(remote) = remote else {
            return Err(TransportError::DataChannel(format!("{} has no remote end", self.label)));
        };
        let delivered = remote.local.emit(PeerEvent::DataChannelMessage {
            label: remote.label.clone(),
            text: text.to_owned(),
        });
        if delivered {
            Ok(())
        } else {
            Err(TransportError::Closed)
        }
    }

    /// Closes both ends; each side sees a `close` event once.
    fn close(&self) {
        let Some(remote) = self.shut() else {
            return;
        };
        self.local.emit(PeerEvent::DataChannelClose {
            label: self.label.clone(),
        });
        if let Some(remote) = remote {
            if remote.shut().is_some() {
                remote.local.emit(PeerEvent::DataChannelClose {
                    label: remote.label.clone(),
                });
            }
        }
    }
}
