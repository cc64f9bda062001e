use crate::log::log_level::LogLevel;

/// One queued log line, as carried from a `LoggerHandle` to the writer thread.
#[derive(Debug, Clone)]
pub struct LogMsg {
    pub level: LogLevel,
    /// Milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    pub text: String,
    /// Module path the line came from.
    pub target: &'static str,
}

impl LogMsg {
    pub fn new(
        level: LogLevel,
        text: impl Into<String>,
        target: &'static str,
        ts_ms: u128,
    ) -> Self {
        Self {
            level,
            ts_ms,
            text: text.into(),
            target,
        }
    }

    /// Line format used by the file writer: `[LEVEL] ts target | text`.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "[{}] {} {} | {}",
            self.level.as_str(),
            self.ts_ms,
            self.target,
            self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_level_target_and_text() {
        let msg = LogMsg::new(LogLevel::Warn, "dropped frame", "meshcall::core", 42);
        assert_eq!(msg.render(), "[WARN] 42 meshcall::core | dropped frame");
    }
}
