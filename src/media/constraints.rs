/// Ideal capture format for a video source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub ideal_frame_rate: f64,
}

impl VideoConstraints {
    /// Camera default: 1280x720 at 30 fps.
    #[must_use]
    pub const fn camera() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            ideal_frame_rate: 30.0,
        }
    }

    /// Display capture default: 1920x1080 at 30 fps.
    #[must_use]
    pub const fn display() -> Self {
        Self {
            ideal_width: 1920,
            ideal_height: 1080,
            ideal_frame_rate: 30.0,
        }
    }
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self::camera()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Camera/microphone request. `None` means the kind is not requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaConstraints {
    pub video: Option<VideoConstraints>,
    pub audio: Option<AudioConstraints>,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: Some(VideoConstraints::camera()),
            audio: Some(AudioConstraints::default()),
        }
    }
}

/// Screen capture request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayConstraints {
    pub video: VideoConstraints,
    pub audio: bool,
}

impl Default for DisplayConstraints {
    fn default() -> Self {
        Self {
            video: VideoConstraints::display(),
            audio: true,
        }
    }
}
