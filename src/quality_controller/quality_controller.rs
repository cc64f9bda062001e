use super::constants::{
    DECREASE_FACTOR, INCREASE_FACTOR, INCREASE_INTERVAL_SECS, LOSS_THRESHOLD,
    RTT_THRESHOLD_MILLIS,
};
use crate::{log::LogSink, sink_debug, sink_warn, stats::RemoteInboundRtpStats};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// What the remote receiver reports about our outgoing video.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkMetrics {
    pub round_trip_time: Duration,
    /// Between 0.0 and 1.0.
    pub fraction_lost: f64,
    pub packets_lost: i64,
}

impl NetworkMetrics {
    #[must_use]
    pub fn from_remote_inbound(r: &RemoteInboundRtpStats) -> Self {
        let rtt_secs = r.round_trip_time.unwrap_or(0.0);
        let round_trip_time = if rtt_secs.is_finite() && rtt_secs > 0.0 {
            Duration::from_secs_f64(rtt_secs)
        } else {
            Duration::ZERO
        };
        Self {
            round_trip_time,
            fraction_lost: r.fraction_lost.clamp(0.0, 1.0),
            packets_lost: r.packets_lost,
        }
    }
}

/// Per-peer sender bitrate controller driven by receiver feedback.
pub struct QualityController {
    current_bitrate_bps: u32,
    min_bitrate_bps: u32,
    max_bitrate_bps: u32,

    last_update: Instant,

    loss_threshold: f64,
    rtt_threshold: Duration,

    increase_interval: Duration,
    increase_factor: f64,
    decrease_factor: f64,

    logger: Arc<dyn LogSink>,
}

impl QualityController {
    /// `min` and `max` are swapped if given in the wrong order; the initial
    /// value is clamped into them.
    pub fn new(initial_bitrate: u32, min_bitrate: u32, max_bitrate: u32, logger: Arc<dyn LogSink>) -> Self {
        let (min_bitrate, max_bitrate) = if min_bitrate <= max_bitrate {
            (min_bitrate, max_bitrate)
        } else {
            (max_bitrate, min_bitrate)
        };
        Self {
            current_bitrate_bps: initial_bitrate.clamp(min_bitrate, max_bitrate),
            min_bitrate_bps: min_bitrate,
            max_bitrate_bps: max_bitrate,
            last_update: Instant::now(),
            loss_threshold: LOSS_THRESHOLD,
            rtt_threshold: Duration::from_millis(RTT_THRESHOLD_MILLIS),
            increase_interval: Duration::from_secs(INCREASE_INTERVAL_SECS),
            increase_factor: INCREASE_FACTOR,
            decrease_factor: DECREASE_FACTOR,
            logger,
        }
    }

    #[must_use]
    pub const fn current_bitrate(&self) -> u32 {
        self.current_bitrate_bps
    }

    pub fn on_network_metrics(&mut self, metrics: &NetworkMetrics) -> Option<u32> {
        self.on_network_metrics_at(metrics, Instant::now())
    }

    /// Returns the new target bitrate when it changed.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn on_network_metrics_at(&mut self, metrics: &NetworkMetrics, now: Instant) -> Option<u32> {
        let scale = |bps: u32, factor: f64| (f64::from(bps) * factor) as u32;
        let mut new_bitrate = self.current_bitrate_bps;

        sink_debug!(
            self.logger.as_ref(),
            "[Quality] loss {:.2}%, rtt {}ms",
            metrics.fraction_lost * 100.0,
            metrics.round_trip_time.as_millis(),
        );

        if metrics.fraction_lost > self.loss_threshold {
            new_bitrate = scale(new_bitrate, self.decrease_factor);
            sink_warn!(
                self.logger.as_ref(),
                "[Quality] High packet loss ({:.2}%), decreasing bitrate to {} bps",
                metrics.fraction_lost * 100.0,
                new_bitrate,
            );
        } else if metrics.round_trip_time > self.rtt_threshold {
            new_bitrate = scale(new_bitrate, self.decrease_factor);
            sink_warn!(
                self.logger.as_ref(),
                "[Quality] High RTT ({}ms), decreasing bitrate to {} bps",
                metrics.round_trip_time.as_millis(),
                new_bitrate
            );
        } else if now.saturating_duration_since(self.last_update) >= self.increase_interval {
            new_bitrate = scale(new_bitrate, self.increase_factor);
            sink_debug!(
                self.logger.as_ref(),
                "[Quality] Network stable, increasing bitrate to {} bps",
                new_bitrate
            );
        }

        new_bitrate = new_bitrate.clamp(self.min_bitrate_bps, self.max_bitrate_bps);

        if new_bitrate == self.current_bitrate_bps {
            return None;
        }
        self.current_bitrate_bps = new_bitrate;
        self.last_update = now;
        Some(new_bitrate)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;

    fn metrics(loss: f64, rtt_ms: u64) -> NetworkMetrics {
        NetworkMetrics {
            round_trip_time: Duration::from_millis(rtt_ms),
            fraction_lost: loss,
            packets_lost: 0,
        }
    }

    fn controller() -> QualityController {
        QualityController::new(1_000_000, 500_000, 1_500_000, Arc::new(NoopLogSink))
    }

    #[test]
    fn high_loss_decreases() {
        let mut qc = controller();
        let t = Instant::now();
        assert_eq!(qc.on_network_metrics_at(&metrics(0.2, 10), t), Some(850_000));
        assert_eq!(qc.current_bitrate(), 850_000);
    }

    #[test]
    fn high_rtt_decreases() {
        let mut qc = controller();
        let t = Instant::now();
        assert_eq!(qc.on_network_metrics_at(&metrics(0.0, 250), t), Some(850_000));
    }

    #[test]
    fn stable_network_increases_only_after_interval() {
        let mut qc = controller();
        let t0 = Instant::now();
        assert_eq!(qc.on_network_metrics_at(&metrics(0.0, 20), t0), None);
        let later = t0 + Duration::from_millis(1_100);
        assert_eq!(qc.on_network_metrics_at(&metrics(0.0, 20), later), Some(1_100_000));
        assert_eq!(
            qc.on_network_metrics_at(&metrics(0.0, 20), later + Duration::from_millis(10)),
            None
        );
    }

    #[test]
    fn clamps_to_limits() {
        let mut qc = controller();
        let mut t = Instant::now();
        for _ in 0..10 {
            t += Duration::from_secs(2);
            qc.on_network_metrics_at(&metrics(0.0, 20), t);
        }
        assert_eq!(qc.current_bitrate(), 1_500_000);

        for _ in 0..20 {
            qc.on_network_metrics_at(&metrics(0.5, 20), t);
        }
        assert_eq!(qc.current_bitrate(), 500_000);
        assert_eq!(qc.on_network_metrics_at(&metrics(0.5, 20), t), None);
    }

    #[test]
    fn swapped_limits_and_out_of_range_initial() {
        let qc = QualityController::new(10, 2_000, 1_000, Arc::new(NoopLogSink));
        assert_eq!(qc.current_bitrate(), 1_000);
    }

    #[test]
    fn metrics_from_remote_inbound() {
        let m = NetworkMetrics::from_remote_inbound(&RemoteInboundRtpStats {
            kind: None,
            fraction_lost: 1.7,
            packets_lost: 3,
            round_trip_time: Some(-1.0),
        });
        assert_eq!(m.fraction_lost, 1.0);
        assert_eq!(m.round_trip_time, Duration::ZERO);
        assert_eq!(m.packets_lost, 3);
    }
}
