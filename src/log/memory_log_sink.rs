use std::sync::Mutex;

use crate::log::{log_level::LogLevel, log_sink::LogSink};

/// Keeps every line in memory. Handy for tests that assert a warning was logged.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    #[must_use]
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// True if any line at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(lvl, text)| *lvl == level && text.contains(needle))
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, level: LogLevel, msg: &str, _target: &'static str) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push((level, msg.to_owned()));
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn records_lines_in_order() {
        let sink = MemoryLogSink::new();
        sink.log(LogLevel::Info, "[Peer] created p1", "t");
        sink.log(LogLevel::Warn, "[Data] channel not open", "t");

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, LogLevel::Info);
        assert!(sink.contains(LogLevel::Warn, "not open"));
        assert!(!sink.contains(LogLevel::Error, "not open"));
    }
}
