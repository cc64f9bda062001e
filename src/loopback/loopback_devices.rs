use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use crate::media::{
    DisplayConstraints, MediaConstraints, MediaDevices, MediaError, MediaStream, MediaTrack,
    TrackKind, TrackRef, TrackSettings,
};

#[derive(Default)]
struct DeviceState {
    deny_camera: AtomicBool,
    deny_display: AtomicBool,
    cancel_display: AtomicBool,
    end_display_at_start: AtomicBool,
    last_display: Mutex<Option<MediaStream>>,
}

/// Synthetic capture devices. Tracks report exactly the ideal settings they
/// were asked for. Clones share the same switches, so a test can keep one
/// handle after giving the other to a manager.
#[derive(Clone, Default)]
pub struct LoopbackDevices {
    state: Arc<DeviceState>,
}

impl LoopbackDevices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera and microphone requests fail with `PermissionDenied`.
    pub fn set_camera_denied(&self, denied: bool) {
        self.state.deny_camera.store(denied, Ordering::Relaxed);
    }

    /// Display requests fail with `PermissionDenied`.
    pub fn set_display_denied(&self, denied: bool) {
        self.state.deny_display.store(denied, Ordering::Relaxed);
    }

    /// Display requests fail with `Aborted`, as if the picker was dismissed.
    pub fn set_display_cancelled(&self, cancelled: bool) {
        self.state.cancel_display.store(cancelled, Ordering::Relaxed);
    }

    /// Display captures come back with their video track already ended, as
    /// when the user stops sharing before the call has picked it up.
    pub fn set_display_ends_at_start(&self, ends: bool) {
        self.state.end_display_at_start.store(ends, Ordering::Relaxed);
    }

    /// Video track of the most recent display capture. Calling
    /// [`MediaTrack::end`] on it simulates the OS "stop sharing" button.
    #[must_use]
    pub fn last_display_track(&self) -> Option<TrackRef> {
        self.state
            .last_display
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|s| s.first_video_track().cloned())
    }
}

impl MediaDevices for LoopbackDevices {
    fn get_user_media(&self, constraints: &MediaConstraints) -> Result<MediaStream, MediaError> {
        if constraints.audio.is_none() && constraints.video.is_none() {
            return Err(MediaError::NotSupported("no media kind requested".into()));
        }
        if self.state.deny_camera.load(Ordering::Relaxed) {
            return Err(MediaError::PermissionDenied);
        }
        let mut tracks = Vec::new();
        if constraints.audio.is_some() {
            tracks.push(MediaTrack::new(
                TrackKind::Audio,
                "Loopback Microphone",
                TrackSettings::default(),
            ));
        }
        if let Some(v) = constraints.video {
            tracks.push(MediaTrack::new(
                TrackKind::Video,
                "Loopback Camera",
                TrackSettings::video(v.ideal_width, v.ideal_height, v.ideal_frame_rate),
            ));
        }
        Ok(MediaStream::new(tracks))
    }

    fn get_display_media(&self, constraints: &DisplayConstraints) -> Result<MediaStream, MediaError> {
        if self.state.cancel_display.load(Ordering::Relaxed) {
            return Err(MediaError::Aborted);
        }
        if self.state.deny_display.load(Ordering::Relaxed) {
            return Err(MediaError::PermissionDenied);
        }
        let v = constraints.video;
        let mut tracks = vec![MediaTrack::new(
            TrackKind::Video,
            "Loopback Display",
            TrackSettings::video(v.ideal_width, v.ideal_height, v.ideal_frame_rate),
        )];
        if constraints.audio {
            tracks.push(MediaTrack::new(
                TrackKind::Audio,
                "Loopback System Audio",
                TrackSettings::default(),
            ));
        }
        let stream = MediaStream::new(tracks);
        if self.state.end_display_at_start.load(Ordering::Relaxed) {
            if let Some(track) = stream.first_video_track() {
                track.end();
            }
        }
        *self
            .state
            .last_display
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(stream.clone());
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::media::TrackState;

    #[test]
    fn camera_follows_constraints() {
        let devices = LoopbackDevices::new();
        let stream = devices.get_user_media(&MediaConstraints::default()).unwrap();
        assert_eq!(stream.audio_tracks().count(), 1);
        let video = stream.first_video_track().unwrap();
        assert_eq!(video.settings(), TrackSettings::video(1280, 720, 30.0));

        let audio_only = MediaConstraints {
            video: None,
            ..MediaConstraints::default()
        };
        assert!(devices.get_user_media(&audio_only).unwrap().first_video_track().is_none());
    }

    #[test]
    fn switches_are_shared_between_clones() {
        let devices = LoopbackDevices::new();
        let handle = devices.clone();
        handle.set_camera_denied(true);
        assert_eq!(
            devices.get_user_media(&MediaConstraints::default()).unwrap_err(),
            MediaError::PermissionDenied
        );
        handle.set_display_cancelled(true);
        assert_eq!(
            devices.get_display_media(&DisplayConstraints::default()).unwrap_err(),
            MediaError::Aborted
        );
    }

    #[test]
    fn display_can_arrive_already_ended() {
        let devices = LoopbackDevices::new();
        devices.set_display_ends_at_start(true);
        let stream = devices.get_display_media(&DisplayConstraints::default()).unwrap();
        assert_eq!(stream.first_video_track().unwrap().ready_state(), TrackState::Ended);
        assert!(stream.audio_tracks().all(|t| t.ready_state() == TrackState::Live));
    }

    #[test]
    fn display_is_remembered() {
        let devices = LoopbackDevices::new();
        assert!(devices.last_display_track().is_none());
        let stream = devices.get_display_media(&DisplayConstraints::default()).unwrap();
        assert_eq!(stream.tracks().len(), 2);
        let track = devices.last_display_track().unwrap();
        assert!(MediaTrack::same(&track, stream.first_video_track().unwrap()));
        assert_eq!(track.settings().width, Some(1920));
    }
}
