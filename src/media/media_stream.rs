use crate::{
    media::media_track::{TrackKind, TrackRef},
    utils::random_id,
};

/// An ordered group of tracks. Cloning shares the tracks, it does not copy them.
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<TrackRef>,
}

impl MediaStream {
    #[must_use]
    pub fn new(tracks: Vec<TrackRef>) -> Self {
        Self::with_id(random_id("stream"), tracks)
    }

    #[must_use]
    pub fn with_id(id: impl Into<String>, tracks: Vec<TrackRef>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &TrackRef> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &TrackRef> {
        self.tracks_of(TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &TrackRef> {
        self.tracks_of(TrackKind::Video)
    }

    #[must_use]
    pub fn first_video_track(&self) -> Option<&TrackRef> {
        self.video_tracks().next()
    }

    /// Adds a track unless the same handle is already present.
    pub fn add_track(&mut self, track: TrackRef) {
        if !self.tracks.iter().any(|t| std::sync::Arc::ptr_eq(t, &track)) {
            self.tracks.push(track);
        }
    }

    pub fn stop_all(&self) {
        for t in &self.tracks {
            t.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::media::media_track::{MediaTrack, TrackSettings, TrackState};

    #[test]
    fn filters_by_kind_and_dedups_handles() {
        let mic = MediaTrack::new(TrackKind::Audio, "mic", TrackSettings::default());
        let cam = MediaTrack::new(TrackKind::Video, "cam", TrackSettings::video(1280, 720, 30.0));
        let mut stream = MediaStream::new(vec![mic.clone()]);
        stream.add_track(cam.clone());
        stream.add_track(cam.clone());

        assert_eq!(stream.tracks().len(), 2);
        assert_eq!(stream.audio_tracks().count(), 1);
        assert!(MediaTrack::same(stream.first_video_track().unwrap(), &cam));

        stream.stop_all();
        assert_eq!(mic.ready_state(), TrackState::Ended);
        assert_eq!(cam.ready_state(), TrackState::Ended);
    }
}
