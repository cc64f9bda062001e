//! Transport statistics: the raw report a backend returns, the simplified
//! per-peer `ConnectionStats` derived from it, and the polling ticker.
pub mod connection_stats;
pub mod stats_collector;
pub mod stats_report;
pub mod stats_ticker;

pub use connection_stats::{ConnectionStats, VideoQuality, classify_video_quality};
pub use stats_collector::StatsCollector;
pub use stats_report::{
    CandidatePairState, CandidatePairStats, InboundRtpStats, RemoteInboundRtpStats, RtcStats,
    StatsReport,
};
