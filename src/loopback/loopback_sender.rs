use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, AtomicU32, Ordering},
};

use crate::{
    media::TrackRef,
    transport::{RtpSender, TransportError},
};

/// Outbound slot of a loopback transport. The remote side reads its track
/// when synthesizing stats, so replacements show up there immediately.
#[derive(Debug)]
pub struct LoopbackSender {
    track: Mutex<Option<TrackRef>>,
    max_bitrate_bps: AtomicU32,
    frozen: AtomicBool,
}

impl LoopbackSender {
    pub(crate) fn new(track: TrackRef) -> Self {
        Self {
            track: Mutex::new(Some(track)),
            max_bitrate_bps: AtomicU32::new(0),
            frozen: AtomicBool::new(false),
        }
    }

    /// While frozen, `replace_track` fails and the current track stays.
    pub(crate) fn set_frozen(&self, frozen: bool) {
        self.frozen.store(frozen, Ordering::Relaxed);
    }

    /// Last value passed to `set_max_bitrate`, if any.
    #[must_use]
    pub fn max_bitrate(&self) -> Option<u32> {
        match self.max_bitrate_bps.load(Ordering::Relaxed) {
            0 => None,
            bps => Some(bps),
        }
    }
}

impl RtpSender for LoopbackSender {
    fn track(&self) -> Option<TrackRef> {
        self.track
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_track(&self, track: Option<TrackRef>) -> Result<(), TransportError> {
        if self.frozen.load(Ordering::Relaxed) {
            return Err(TransportError::Backend("sender refuses track replacement".into()));
        }
        let mut slot = self.track.lock().unwrap_or_else(PoisonError::into_inner);
        if let (Some(current), Some(next)) = (slot.as_ref(), track.as_ref()) {
            if current.kind() != next.kind() {
                return Err(TransportError::InvalidState(format!(
                    "cannot replace {} track with {}",
                    current.kind().as_str(),
                    next.kind().as_str()
                )));
            }
        }
        *slot = track;
        Ok(())
    }

    fn set_max_bitrate(&self, bitrate_bps: u32) -> Result<(), TransportError> {
        if bitrate_bps == 0 {
            return Err(TransportError::InvalidState("bitrate must be positive".into()));
        }
        self.max_bitrate_bps.store(bitrate_bps, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::media::{MediaTrack, TrackKind, TrackSettings};

    #[test]
    fn replace_keeps_identity_and_rejects_kind_change() {
        let cam = MediaTrack::new(TrackKind::Video, "cam", TrackSettings::video(640, 480, 30.0));
        let screen = MediaTrack::new(TrackKind::Video, "screen", TrackSettings::video(1920, 1080, 30.0));
        let mic = MediaTrack::new(TrackKind::Audio, "mic", TrackSettings::default());
        let sender = LoopbackSender::new(cam.clone());

        sender.replace_track(Some(screen.clone())).unwrap();
        assert!(MediaTrack::same(&sender.track().unwrap(), &screen));
        assert!(sender.replace_track(Some(mic)).is_err());
        sender.replace_track(Some(cam.clone())).unwrap();
        assert!(MediaTrack::same(&sender.track().unwrap(), &cam));
    }

    #[test]
    fn frozen_sender_keeps_its_track() {
        let cam = MediaTrack::new(TrackKind::Video, "cam", TrackSettings::default());
        let screen = MediaTrack::new(TrackKind::Video, "screen", TrackSettings::default());
        let sender = LoopbackSender::new(cam.clone());

        sender.set_frozen(true);
        assert!(matches!(
            sender.replace_track(Some(screen.clone())),
            Err(TransportError::Backend(_))
        ));
        assert!(MediaTrack::same(&sender.track().unwrap(), &cam));

        sender.set_frozen(false);
        sender.replace_track(Some(screen.clone())).unwrap();
        assert!(MediaTrack::same(&sender.track().unwrap(), &screen));
    }

    #[test]
    fn bitrate_is_recorded() {
        let cam = MediaTrack::new(TrackKind::Video, "cam", TrackSettings::default());
        let sender = LoopbackSender::new(cam);
        assert_eq!(sender.max_bitrate(), None);
        sender.set_max_bitrate(750_000).unwrap();
        assert_eq!(sender.max_bitrate(), Some(750_000));
        assert!(sender.set_max_bitrate(0).is_err());
    }
}
