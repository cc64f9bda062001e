use std::sync::mpsc;

use crate::{
    log::{log_level::LogLevel, log_msg::LogMsg, log_sink::LogSink},
    utils::now_millis,
};

/// Cloneable, non-blocking handle to the process `Logger`.
///
/// Lines are pushed into a bounded queue; when the queue is full the line is
/// dropped rather than stalling the caller.
#[derive(Clone)]
pub struct LoggerHandle {
    pub(super) tx: mpsc::SyncSender<LogMsg>,
}

impl LogSink for LoggerHandle {
    #[inline]
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        let _ = self.try_log(level, msg, target);
    }
}

impl LoggerHandle {
    /// Enqueues a line stamped with the current time.
    ///
    /// # Errors
    /// - `TrySendError::Full` when the queue is at capacity (the line is dropped).
    /// - `TrySendError::Disconnected` when the writer thread is gone.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), mpsc::TrySendError<LogMsg>> {
        self.tx
            .try_send(LogMsg::new(level, text, target, now_millis()))
    }
}
