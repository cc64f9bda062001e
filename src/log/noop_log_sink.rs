use crate::log::{log_level::LogLevel, log_sink::LogSink};

/// Discards every line. Handy for components under test whose output is irrelevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    #[inline]
    fn log(&self, _level: LogLevel, _msg: &str, _target: &'static str) {}
}
