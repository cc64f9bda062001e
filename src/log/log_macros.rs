//! Leveled logging macros over any `LogSink`.
//!
//! # Feature Flags
//! Levels are switched on by cargo features:
//! `log-trace`, `log-debug`, `log-info`, `log-warn`, `log-error`.
//!
//! A disabled level only borrows the sink, so its formatting and allocation
//! are compiled out while the sink still counts as used.

#[macro_export]
macro_rules! sink_log {
    ($sink:expr, $lvl:expr, $($arg:tt)*) => {{
        let __msg = format!($($arg)*);
        $sink.log($lvl, &__msg, module_path!());
    }};
}

// ---------------------- TRACE ----------------------
#[cfg(feature = "log-trace")]
#[macro_export]
macro_rules! sink_trace { ($sink:expr, $($arg:tt)*) => { $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Trace, $($arg)*) } }

#[cfg(not(feature = "log-trace"))]
#[macro_export]
macro_rules! sink_trace {
    ($sink:expr, $($arg:tt)*) => {{
        let _ = &$sink;
    }};
}

// ---------------------- DEBUG ----------------------
#[cfg(feature = "log-debug")]
#[macro_export]
macro_rules! sink_debug { ($sink:expr, $($arg:tt)*) => { $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Debug, $($arg)*) } }

#[cfg(not(feature = "log-debug"))]
#[macro_export]
macro_rules! sink_debug {
    ($sink:expr, $($arg:tt)*) => {{
        let _ = &$sink;
    }};
}

// ---------------------- INFO ----------------------
#[cfg(feature = "log-info")]
#[macro_export]
macro_rules! sink_info { ($sink:expr, $($arg:tt)*) => { $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Info, $($arg)*) } }

#[cfg(not(feature = "log-info"))]
#[macro_export]
macro_rules! sink_info {
    ($sink:expr, $($arg:tt)*) => {{
        let _ = &$sink;
    }};
}

// ---------------------- WARN ----------------------
#[cfg(feature = "log-warn")]
#[macro_export]
macro_rules! sink_warn { ($sink:expr, $($arg:tt)*) => { $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Warn, $($arg)*) } }

#[cfg(not(feature = "log-warn"))]
#[macro_export]
macro_rules! sink_warn {
    ($sink:expr, $($arg:tt)*) => {{
        let _ = &$sink;
    }};
}

// ---------------------- ERROR ----------------------
// Generally always enabled, but kept symmetric so it can be switched off too.
#[cfg(feature = "log-error")]
#[macro_export]
macro_rules! sink_error { ($sink:expr, $($arg:tt)*) => { $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Error, $($arg)*) } }

#[cfg(not(feature = "log-error"))]
#[macro_export]
macro_rules! sink_error {
    ($sink:expr, $($arg:tt)*) => {{
        let _ = &$sink;
    }};
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::{sync::Arc, thread};

    use crate::log::{LogSink, log_level::LogLevel, memory_log_sink::MemoryLogSink};

    #[test]
    fn levels_follow_enabled_features() {
        let sink = MemoryLogSink::new();
        sink_trace!(sink, "trace {}", 1);
        sink_debug!(sink, "debug {}", 2);
        sink_info!(sink, "info {}", 3);
        sink_warn!(sink, "warn {}", 4);
        sink_error!(sink, "error {}", 5);

        assert_eq!(sink.contains(LogLevel::Trace, "trace 1"), cfg!(feature = "log-trace"));
        assert_eq!(sink.contains(LogLevel::Debug, "debug 2"), cfg!(feature = "log-debug"));
        assert_eq!(sink.contains(LogLevel::Info, "info 3"), cfg!(feature = "log-info"));
        assert_eq!(sink.contains(LogLevel::Warn, "warn 4"), cfg!(feature = "log-warn"));
        assert_eq!(sink.contains(LogLevel::Error, "error 5"), cfg!(feature = "log-error"));
    }

    #[test]
    fn sink_moved_into_a_thread_for_one_line_is_still_used() {
        let sink = Arc::new(MemoryLogSink::new());
        let thread_sink: Arc<dyn LogSink> = sink.clone();
        thread::spawn(move || sink_debug!(thread_sink, "[Test] worker done"))
            .join()
            .unwrap();
        assert_eq!(
            sink.contains(LogLevel::Debug, "worker done"),
            cfg!(feature = "log-debug")
        );
    }
}
