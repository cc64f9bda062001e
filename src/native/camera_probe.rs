use opencv::{
    prelude::*,
    videoio::{self, VideoCapture},
};

use crate::{
    media::{TrackSettings, VideoConstraints},
    native::camera_error::CameraError,
};

/// Opens a camera, asks it for the ideal format and reads back what it
/// actually delivers. The device is released when the probe is dropped.
pub struct CameraProbe {
    cam: Option<VideoCapture>,
    settings: TrackSettings,
}

impl CameraProbe {
    /// # Errors
    /// `InvalidDeviceId`/`OpenFailed` when there is no such camera,
    /// `InitializationFailed` when `OpenCV` cannot query it.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn open(device_id: usize, ideal: &VideoConstraints) -> Result<Self, CameraError> {
        let index = i32::try_from(device_id).map_err(|_| CameraError::InvalidDeviceId(device_id))?;
        let mut cam = VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|e| CameraError::InitializationFailed(e.to_string()))?;
        if !cam.is_opened().unwrap_or(false) {
            return Err(CameraError::OpenFailed(device_id));
        }

        // Requests are hints; the driver picks the closest mode.
        let _ = cam.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(ideal.ideal_width));
        let _ = cam.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(ideal.ideal_height));
        let _ = cam.set(videoio::CAP_PROP_FPS, ideal.ideal_frame_rate);

        let width = cam.get(videoio::CAP_PROP_FRAME_WIDTH)?.clamp(1.0, 8192.0);
        let height = cam.get(videoio::CAP_PROP_FRAME_HEIGHT)?.clamp(1.0, 8192.0);
        let fps = cam.get(videoio::CAP_PROP_FPS)?;
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            ideal.ideal_frame_rate
        };

        Ok(Self {
            cam: Some(cam),
            settings: TrackSettings::video(width.round() as u32, height.round() as u32, fps),
        })
    }

    #[must_use]
    pub const fn settings(&self) -> TrackSettings {
        self.settings
    }
}

impl Drop for CameraProbe {
    fn drop(&mut self) {
        if let Some(mut cam) = self.cam.take() {
            let _ = cam.release();
        }
    }
}
