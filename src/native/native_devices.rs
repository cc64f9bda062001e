use std::sync::Arc;

use crate::{
    log::LogSink,
    media::{
        DisplayConstraints, MediaConstraints, MediaDevices, MediaError, MediaStream, MediaTrack,
        TrackKind, TrackSettings,
    },
    native::{camera_probe::CameraProbe, microphone_probe::probe_default_microphone},
    sink_info, sink_warn,
};

/// `MediaDevices` over the machine's real camera and microphone. Tracks
/// carry the format the hardware agreed to. Display capture is not
/// available on this backend.
pub struct NativeDevices {
    camera_index: usize,
    logger: Arc<dyn LogSink>,
}

impl NativeDevices {
    #[must_use]
    pub fn new(camera_index: usize, logger: Arc<dyn LogSink>) -> Self {
        Self {
            camera_index,
            logger,
        }
    }
}

impl MediaDevices for NativeDevices {
    fn get_user_media(&self, constraints: &MediaConstraints) -> Result<MediaStream, MediaError> {
        let mut tracks = Vec::new();

        if constraints.audio.is_some() {
            let mic = probe_default_microphone().inspect_err(|e| {
                sink_warn!(self.logger, "[Media] microphone unavailable: {e}");
            })?;
            sink_info!(
                self.logger,
                "[Media] microphone {} at {} Hz, {} ch",
                mic.name,
                mic.sample_rate_hz,
                mic.channels
            );
            tracks.push(MediaTrack::new(TrackKind::Audio, mic.name, TrackSettings::default()));
        }

        if let Some(video) = constraints.video {
            let probe = CameraProbe::open(self.camera_index, &video).map_err(|e| {
                sink_warn!(self.logger, "[Media] camera {} unavailable: {e}", self.camera_index);
                MediaError::from(e)
            })?;
            tracks.push(MediaTrack::new(
                TrackKind::Video,
                format!("Camera {}", self.camera_index),
                probe.settings(),
            ));
        }

        if tracks.is_empty() {
            return Err(MediaError::NotSupported("no media kind requested".into()));
        }
        Ok(MediaStream::new(tracks))
    }

    fn get_display_media(&self, _constraints: &DisplayConstraints) -> Result<MediaStream, MediaError> {
        Err(MediaError::NotSupported("display capture".into()))
    }
}
