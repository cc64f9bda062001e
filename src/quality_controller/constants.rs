/// Fraction of packets lost above which the bitrate is reduced.
pub const LOSS_THRESHOLD: f64 = 0.1;
/// RTT in milliseconds above which the bitrate is reduced.
pub const RTT_THRESHOLD_MILLIS: u64 = 200;
/// Seconds of stable network required before each increase.
pub const INCREASE_INTERVAL_SECS: u64 = 1;
pub const INCREASE_FACTOR: f64 = 1.1;
pub const DECREASE_FACTOR: f64 = 0.85;

pub const DEFAULT_INITIAL_BITRATE: u32 = 1_000_000;
pub const DEFAULT_MIN_BITRATE: u32 = 500_000;
pub const DEFAULT_MAX_BITRATE: u32 = 1_500_000;
