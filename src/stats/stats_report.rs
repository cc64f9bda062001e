use crate::media::TrackKind;

/// Counters for one received RTP stream (`inbound-rtp`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundRtpStats {
    pub kind: Option<TrackKind>,
    pub bytes_received: u64,
    pub packets_received: u64,
    /// Cumulative; may go negative when duplicates arrive.
    pub packets_lost: i64,
    pub frame_width: Option<u32>,
    pub frame_height: Option<u32>,
    pub frames_per_second: Option<f64>,
    /// 0.0 ..= 1.0
    pub audio_level: Option<f64>,
    /// Seconds.
    pub jitter: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidatePairState {
    Frozen,
    Waiting,
    InProgress,
    Failed,
    Succeeded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePairStats {
    pub state: CandidatePairState,
    pub nominated: bool,
    /// Seconds.
    pub current_round_trip_time: Option<f64>,
}

/// What the remote receiver reports about our outgoing stream (`remote-inbound-rtp`).
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteInboundRtpStats {
    pub kind: Option<TrackKind>,
    /// 0.0 ..= 1.0, over the last report interval.
    pub fraction_lost: f64,
    pub packets_lost: i64,
    /// Seconds.
    pub round_trip_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RtcStats {
    InboundRtp(InboundRtpStats),
    CandidatePair(CandidatePairStats),
    RemoteInboundRtp(RemoteInboundRtpStats),
    /// Any entry type the parser does not use.
    Other { stats_type: String },
}

/// One `getStats()` result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsReport {
    pub entries: Vec<RtcStats>,
}

impl StatsReport {
    #[must_use]
    pub fn new(entries: Vec<RtcStats>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RtcStats> {
        self.entries.iter()
    }
}
