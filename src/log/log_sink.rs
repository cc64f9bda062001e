use crate::log::log_level::LogLevel;

/// Destination for log lines. Every component receives one as `Arc<dyn LogSink>`.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}
