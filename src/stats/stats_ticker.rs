use std::{
    sync::{
        Arc,
        mpsc::{self, RecvTimeoutError, Sender},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{core::manager_input::ManagerInput, log::LogSink, sink_debug, sink_error};

/// Background timer that posts a `StatsTick` into the manager's input
/// channel every `interval`, until stopped or the manager goes away.
pub struct StatsTicker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StatsTicker {
    pub(crate) fn spawn(
        interval: Duration,
        tx: Sender<ManagerInput>,
        logger: Arc<dyn LogSink>,
    ) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread_logger = logger.clone();
        let spawned = thread::Builder::new()
            .name("stats-ticker".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if tx.send(ManagerInput::StatsTick).is_err() {
                                break;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                sink_debug!(thread_logger, "[Stats] ticker stopped");
            });

        let handle = match spawned {
            Ok(h) => Some(h),
            Err(e) => {
                sink_error!(logger, "[Stats] could not start ticker thread: {e}");
                None
            }
        };

        Self {
            stop_tx: Some(stop_tx),
            handle,
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Wakes the thread and joins it. Idempotent.
    pub fn stop(&mut self) {
        self.stop_tx.take();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for StatsTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
