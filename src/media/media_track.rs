use std::{
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::utils::random_id;

/// Shared handle to a track. Every peer that attached the track holds the
/// same `Arc`, so identity comparisons use [`MediaTrack::same`].
pub type TrackRef = Arc<MediaTrack>;

type EndedListener = Box<dyn Fn(&MediaTrack) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Live,
    Ended,
}

/// What the capture source actually delivers. Audio tracks leave these empty.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackSettings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
}

impl TrackSettings {
    #[must_use]
    pub const fn video(width: u32, height: u32, frame_rate: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            frame_rate: Some(frame_rate),
        }
    }
}

/// One audio or video source.
///
/// The `enabled` flag is the source of truth for mute state: flipping it
/// takes effect on every connection carrying the track, with no renegotiation.
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    label: String,
    settings: TrackSettings,
    enabled: AtomicBool,
    ended: AtomicBool,
    ended_listeners: Mutex<Vec<EndedListener>>,
}

impl MediaTrack {
    #[must_use]
    pub fn new(kind: TrackKind, label: impl Into<String>, settings: TrackSettings) -> TrackRef {
        Self::with_id(random_id(kind.as_str()), kind, label, settings)
    }

    #[must_use]
    pub fn with_id(
        id: impl Into<String>,
        kind: TrackKind,
        label: impl Into<String>,
        settings: TrackSettings,
    ) -> TrackRef {
        Arc::new(Self {
            id: id.into(),
            kind,
            label: label.into(),
            settings,
            enabled: AtomicBool::new(true),
            ended: AtomicBool::new(false),
            ended_listeners: Mutex::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> TrackKind {
        self.kind
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn settings(&self) -> TrackSettings {
        self.settings
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    #[must_use]
    pub fn ready_state(&self) -> TrackState {
        if self.ended.load(Ordering::SeqCst) {
            TrackState::Ended
        } else {
            TrackState::Live
        }
    }

    /// Releases the source. Ended listeners are dropped without being called,
    /// matching a local, deliberate stop.
    pub fn stop(&self) {
        self.ended.store(true, Ordering::SeqCst);
        if let Ok(mut guard) = self.ended_listeners.lock() {
            guard.clear();
        }
    }

    /// Called by a capture backend when the source goes away on its own
    /// (device unplugged, user pressed "stop sharing"). Listeners fire once.
    pub fn end(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        let listeners = self
            .ended_listeners
            .lock()
            .map(|mut g| std::mem::take(&mut *g))
            .unwrap_or_default();
        for listener in &listeners {
            listener(self);
        }
    }

    /// Registers a callback for [`end`](Self::end). Ignored on an ended track.
    pub fn on_ended(&self, listener: impl Fn(&Self) + Send + Sync + 'static) {
        if self.ready_state() == TrackState::Ended {
            return;
        }
        if let Ok(mut guard) = self.ended_listeners.lock() {
            guard.push(Box::new(listener));
        }
    }

    /// Identity, not structural, equality.
    #[must_use]
    pub fn same(a: &TrackRef, b: &TrackRef) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("enabled", &self.is_enabled())
            .field("state", &self.ready_state())
            .finish_non_exhaustive()
    }
}
