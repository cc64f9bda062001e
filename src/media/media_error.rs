use std::fmt;

/// Failures from a capture backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The user or platform refused access.
    PermissionDenied,
    /// No device matching the request.
    NotFound(String),
    /// The backend cannot produce this kind of capture at all.
    NotSupported(String),
    /// The user dismissed the picker.
    Aborted,
    /// Any other device failure.
    Device(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::NotFound(what) => write!(f, "no device found: {what}"),
            Self::NotSupported(what) => write!(f, "not supported: {what}"),
            Self::Aborted => write!(f, "capture request aborted"),
            Self::Device(msg) => write!(f, "device error: {msg}"),
        }
    }
}

impl std::error::Error for MediaError {}
