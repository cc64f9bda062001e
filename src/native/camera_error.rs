use opencv::Error as CvError;
use std::fmt;

use crate::media::MediaError;

#[derive(Debug)]
pub enum CameraError {
    InitializationFailed(String),
    OpenFailed(usize),
    InvalidDeviceId(usize),
    OpenCvError(CvError),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed(msg) => write!(f, "Camera initialization failed: {msg}"),
            Self::OpenFailed(id) => write!(f, "Failed to open camera with device_id: {id}"),
            Self::InvalidDeviceId(id) => write!(f, "Invalid Device ID: {id}"),
            Self::OpenCvError(e) => write!(f, "OpenCV error: {e}"),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<CvError> for CameraError {
    fn from(err: CvError) -> Self {
        Self::OpenCvError(err)
    }
}

impl From<CameraError> for MediaError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::OpenFailed(id) | CameraError::InvalidDeviceId(id) => {
                Self::NotFound(format!("camera {id}"))
            }
            other => Self::Device(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn missing_camera_maps_to_not_found() {
        assert_eq!(
            MediaError::from(CameraError::OpenFailed(2)),
            MediaError::NotFound("camera 2".into())
        );
        let err = MediaError::from(CameraError::InitializationFailed("no backend".into()));
        assert!(matches!(err, MediaError::Device(msg) if msg.contains("no backend")));
    }
}
