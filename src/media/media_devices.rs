use crate::media::{
    constraints::{DisplayConstraints, MediaConstraints},
    media_error::MediaError,
    media_stream::MediaStream,
};

/// Capture backend. Calls may block while the platform prompts the user.
pub trait MediaDevices: Send {
    /// Opens camera and/or microphone per `constraints`.
    ///
    /// # Errors
    /// Any `MediaError` the platform reports.
    fn get_user_media(&self, constraints: &MediaConstraints) -> Result<MediaStream, MediaError>;

    /// Opens a display (screen/window) capture.
    ///
    /// # Errors
    /// Any `MediaError` the platform reports, `Aborted` if the picker is dismissed.
    fn get_display_media(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<MediaStream, MediaError>;
}
