use crate::media::{
    media_stream::MediaStream,
    media_track::{TrackKind, TrackRef},
};

/// The local participant's outgoing media.
///
/// At most one of {camera video, screen video} is the outgoing video track on
/// any peer at a time; which one is tracked by `sharing`.
#[derive(Debug, Default)]
pub struct LocalMedia {
    camera: Option<MediaStream>,
    screen: Option<MediaStream>,
    sharing: bool,
}

impl LocalMedia {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn camera(&self) -> Option<&MediaStream> {
        self.camera.as_ref()
    }

    #[must_use]
    pub const fn screen(&self) -> Option<&MediaStream> {
        self.screen.as_ref()
    }

    #[must_use]
    pub const fn is_sharing(&self) -> bool {
        self.sharing
    }

    #[must_use]
    pub fn camera_video_track(&self) -> Option<&TrackRef> {
        self.camera.as_ref().and_then(MediaStream::first_video_track)
    }

    #[must_use]
    pub fn screen_video_track(&self) -> Option<&TrackRef> {
        self.screen.as_ref().and_then(MediaStream::first_video_track)
    }

    /// Stores a freshly acquired camera stream, stopping any previous one.
    pub fn set_camera(&mut self, stream: MediaStream) {
        if let Some(old) = self.camera.replace(stream) {
            old.stop_all();
        }
    }

    pub fn begin_share(&mut self, stream: MediaStream) {
        self.screen = Some(stream);
        self.sharing = true;
    }

    /// Clears the sharing flag and hands back the screen stream, if any.
    pub fn end_share(&mut self) -> Option<MediaStream> {
        self.sharing = false;
        self.screen.take()
    }

    /// Sets (or flips, when `enabled` is `None`) every track of `kind` in the
    /// camera stream. Returns the new state, or `None` when there is nothing
    /// to toggle.
    pub fn toggle(&self, kind: TrackKind, enabled: Option<bool>) -> Option<bool> {
        let stream = self.camera.as_ref()?;
        let first = stream.tracks_of(kind).next()?;
        let next = enabled.unwrap_or(!first.is_enabled());
        for track in stream.tracks_of(kind) {
            track.set_enabled(next);
        }
        Some(next)
    }

    /// Stops and drops both streams.
    pub fn release(&mut self) {
        if let Some(s) = self.camera.take() {
            s.stop_all();
        }
        if let Some(s) = self.screen.take() {
            s.stop_all();
        }
        self.sharing = false;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::media::media_track::{MediaTrack, TrackSettings, TrackState};

    fn av_stream() -> MediaStream {
        MediaStream::new(vec![
            MediaTrack::new(TrackKind::Audio, "mic", TrackSettings::default()),
            MediaTrack::new(TrackKind::Video, "cam", TrackSettings::video(1280, 720, 30.0)),
        ])
    }

    #[test]
    fn toggle_without_stream_is_none() {
        let media = LocalMedia::new();
        assert_eq!(media.toggle(TrackKind::Audio, None), None);
        assert_eq!(media.toggle(TrackKind::Video, Some(true)), None);
    }

    #[test]
    fn toggle_flips_from_first_track_and_honours_explicit_value() {
        let mut media = LocalMedia::new();
        media.set_camera(av_stream());

        assert_eq!(media.toggle(TrackKind::Audio, None), Some(false));
        assert_eq!(media.toggle(TrackKind::Audio, None), Some(true));
        assert_eq!(media.toggle(TrackKind::Video, Some(false)), Some(false));
        assert_eq!(media.toggle(TrackKind::Video, Some(false)), Some(false));

        let cam = media.camera_video_track().unwrap();
        assert!(!cam.is_enabled());
    }

    #[test]
    fn toggle_on_stream_without_that_kind_is_none() {
        let mut media = LocalMedia::new();
        media.set_camera(MediaStream::new(vec![MediaTrack::new(
            TrackKind::Audio,
            "mic",
            TrackSettings::default(),
        )]));
        assert_eq!(media.toggle(TrackKind::Video, None), None);
    }

    #[test]
    fn release_stops_everything() {
        let mut media = LocalMedia::new();
        let cam = av_stream();
        let screen = av_stream();
        media.set_camera(cam.clone());
        media.begin_share(screen.clone());
        assert!(media.is_sharing());

        media.release();
        assert!(!media.is_sharing());
        assert!(media.camera().is_none() && media.screen().is_none());
        for t in cam.tracks().iter().chain(screen.tracks()) {
            assert_eq!(t.ready_state(), TrackState::Ended);
        }
    }
}
