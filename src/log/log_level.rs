/// Defines the severity levels for log messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Very fine-grained events (per-packet, per-candidate).
    Trace,
    /// Events useful while debugging a call.
    Debug,
    /// Coarse progress of a call (peer connected, share started).
    Info,
    /// Something was dropped or skipped but the call continues.
    Warn,
    /// A peer-scoped or media failure.
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}
