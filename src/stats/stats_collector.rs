use std::{collections::HashMap, time::Instant};

use crate::{
    quality_controller::NetworkMetrics,
    stats::{
        connection_stats::{ConnectionStats, outbound_video_metrics},
        stats_report::StatsReport,
    },
};

#[derive(Debug, Clone, Copy)]
struct ByteSample {
    kb: f64,
    at: Instant,
}

/// Turns raw reports into snapshots and remembers the previous byte counter
/// per peer so a true rate can be derived alongside the cumulative value.
#[derive(Debug, Default)]
pub struct StatsCollector {
    samples: HashMap<String, ByteSample>,
}

impl StatsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `report` for `peer_id` as observed at `now`.
    pub fn record(
        &mut self,
        peer_id: &str,
        report: &StatsReport,
        now: Instant,
    ) -> (ConnectionStats, Option<NetworkMetrics>) {
        let mut stats = ConnectionStats::from_report(report);
        let current = ByteSample {
            kb: stats.bandwidth,
            at: now,
        };

        if let Some(prev) = self.samples.insert(peer_id.to_owned(), current) {
            let secs = now.saturating_duration_since(prev.at).as_secs_f64();
            if secs > 0.0 {
                stats.throughput_kbps = Some((current.kb - prev.kb).max(0.0) / secs);
            }
        }

        (stats, outbound_video_metrics(report))
    }

    pub fn forget(&mut self, peer_id: &str) {
        self.samples.remove(peer_id);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
