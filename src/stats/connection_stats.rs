use serde::Serialize;

use crate::{
    media::TrackKind,
    quality_controller::NetworkMetrics,
    stats::stats_report::{CandidatePairState, RtcStats, StatsReport},
};

/// Coarse classification of the received video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoQuality {
    #[default]
    Low,
    Medium,
    High,
}

/// Simplified per-peer quality snapshot, replaced on every poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStats {
    /// Cumulative inbound video bytes, in KB. A counter, not a rate.
    pub bandwidth: f64,
    /// Inbound video packets lost, as a percentage of packets received.
    pub packet_loss: f64,
    /// Current round-trip time of the succeeded candidate pair, ms.
    pub latency: f64,
    /// Inbound audio jitter, ms.
    pub jitter: f64,
    pub audio_level: f64,
    pub video_quality: VideoQuality,
    /// KB/s between this poll and the previous one for the same peer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput_kbps: Option<f64>,
}

/// `High` needs ≥1280x720 at ≥25 fps, `Medium` ≥640x480 at ≥15 fps.
#[must_use]
pub fn classify_video_quality(width: u32, height: u32, fps: f64) -> VideoQuality {
    if width >= 1280 && height >= 720 && fps >= 25.0 {
        VideoQuality::High
    } else if width >= 640 && height >= 480 && fps >= 15.0 {
        VideoQuality::Medium
    } else {
        VideoQuality::Low
    }
}

/// Lost over received (received floored at 1), as a percentage. A negative
/// lost count, as receivers may report after duplicates, stays negative.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn packet_loss_percent(packets_lost: i64, packets_received: u64) -> f64 {
    let lost = packets_lost as f64;
    let received = packets_received.max(1) as f64;
    lost / received * 100.0
}

impl ConnectionStats {
    /// Folds a raw report into a snapshot. Entries the rules do not mention
    /// are ignored; missing fields leave the defaults in place.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_report(report: &StatsReport) -> Self {
        let mut stats = Self::default();
        for entry in report.iter() {
            match entry {
                RtcStats::InboundRtp(rtp) if rtp.kind == Some(TrackKind::Video) => {
                    stats.bandwidth = rtp.bytes_received as f64 / 1024.0;
                    stats.packet_loss =
                        packet_loss_percent(rtp.packets_lost, rtp.packets_received);
                    stats.video_quality = classify_video_quality(
                        rtp.frame_width.unwrap_or(0),
                        rtp.frame_height.unwrap_or(0),
                        rtp.frames_per_second.unwrap_or(0.0),
                    );
                }
                RtcStats::InboundRtp(rtp) if rtp.kind == Some(TrackKind::Audio) => {
                    stats.audio_level = rtp.audio_level.unwrap_or(0.0);
                    stats.jitter = rtp.jitter.unwrap_or(0.0) * 1000.0;
                }
                RtcStats::CandidatePair(pair) if pair.state == CandidatePairState::Succeeded => {
                    stats.latency = pair.current_round_trip_time.unwrap_or(0.0) * 1000.0;
                }
                _ => {}
            }
        }
        stats
    }
}

/// Remote receiver feedback on our outgoing video, if the report has it.
#[must_use]
pub fn outbound_video_metrics(report: &StatsReport) -> Option<NetworkMetrics> {
    report.iter().find_map(|entry| match entry {
        RtcStats::RemoteInboundRtp(r) if r.kind == Some(TrackKind::Video) => {
            Some(NetworkMetrics::from_remote_inbound(r))
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::stats::stats_report::{CandidatePairStats, InboundRtpStats, RemoteInboundRtpStats};

    fn video(lost: i64, received: u64) -> RtcStats {
        RtcStats::InboundRtp(InboundRtpStats {
            kind: Some(TrackKind::Video),
            bytes_received: 2048,
            packets_received: received,
            packets_lost: lost,
            frame_width: Some(640),
            frame_height: Some(480),
            frames_per_second: Some(20.0),
            ..InboundRtpStats::default()
        })
    }

    #[test]
    fn quality_thresholds() {
        assert_eq!(classify_video_quality(1280, 720, 25.0), VideoQuality::High);
        assert_eq!(classify_video_quality(640, 480, 15.0), VideoQuality::Medium);
        assert_eq!(classify_video_quality(320, 240, 10.0), VideoQuality::Low);
        assert_eq!(classify_video_quality(1280, 720, 24.9), VideoQuality::Medium);
        assert_eq!(classify_video_quality(1920, 1080, 14.0), VideoQuality::Low);
        assert_eq!(classify_video_quality(1280, 719, 60.0), VideoQuality::Medium);
    }

    #[test]
    fn packet_loss_uses_floor_of_one() {
        assert!((packet_loss_percent(10, 90) - 11.111_111).abs() < 1e-4);
        assert_eq!(packet_loss_percent(5, 0), 500.0);
        assert_eq!(packet_loss_percent(0, 0), 0.0);
        assert!(packet_loss_percent(u32::MAX.into(), 0).is_finite());
    }

    #[test]
    fn negative_loss_is_not_clamped() {
        assert_eq!(packet_loss_percent(-3, 10), -30.0);
        assert_eq!(packet_loss_percent(-1, 0), -100.0);
    }

    #[test]
    fn parses_full_report() {
        let report = StatsReport::new(vec![
            video(10, 90),
            RtcStats::InboundRtp(InboundRtpStats {
                kind: Some(TrackKind::Audio),
                audio_level: Some(0.25),
                jitter: Some(0.012),
                ..InboundRtpStats::default()
            }),
            RtcStats::CandidatePair(CandidatePairStats {
                state: CandidatePairState::InProgress,
                nominated: false,
                current_round_trip_time: Some(9.0),
            }),
            RtcStats::CandidatePair(CandidatePairStats {
                state: CandidatePairState::Succeeded,
                nominated: true,
                current_round_trip_time: Some(0.045),
            }),
            RtcStats::Other {
                stats_type: "codec".into(),
            },
        ]);

        let stats = ConnectionStats::from_report(&report);
        assert_eq!(stats.bandwidth, 2.0);
        assert!((stats.packet_loss - 11.11).abs() < 0.01);
        assert_eq!(stats.video_quality, VideoQuality::Medium);
        assert_eq!(stats.audio_level, 0.25);
        assert!((stats.jitter - 12.0).abs() < 1e-9);
        assert!((stats.latency - 45.0).abs() < 1e-9);
        assert_eq!(stats.throughput_kbps, None);
    }

    #[test]
    fn empty_report_gives_defaults() {
        let stats = ConnectionStats::from_report(&StatsReport::default());
        assert_eq!(stats, ConnectionStats::default());
        assert_eq!(stats.video_quality, VideoQuality::Low);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(ConnectionStats::default()).unwrap();
        assert!(json.get("packetLoss").is_some());
        assert_eq!(json["videoQuality"], "low");
        assert!(json.get("throughputKbps").is_none());
    }

    #[test]
    fn picks_video_remote_inbound_metrics() {
        let report = StatsReport::new(vec![
            RtcStats::RemoteInboundRtp(RemoteInboundRtpStats {
                kind: Some(TrackKind::Audio),
                fraction_lost: 0.9,
                packets_lost: 1,
                round_trip_time: None,
            }),
            RtcStats::RemoteInboundRtp(RemoteInboundRtpStats {
                kind: Some(TrackKind::Video),
                fraction_lost: 0.2,
                packets_lost: 7,
                round_trip_time: Some(0.3),
            }),
        ]);
        let m = outbound_video_metrics(&report).unwrap();
        assert!((m.fraction_lost - 0.2).abs() < 1e-9);
        assert_eq!(m.round_trip_time.as_millis(), 300);
        assert!(outbound_video_metrics(&StatsReport::default()).is_none());
    }
}
