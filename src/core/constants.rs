pub const DEFAULT_STUN_SERVERS: [&str; 2] = [
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];
pub const DEFAULT_STATS_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_DATA_CHANNEL_LABEL: &str = "metadata";
