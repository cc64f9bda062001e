use std::time::SystemTime;

use rand::{RngCore, rngs::OsRng};

/// Milliseconds since the UNIX epoch, or 0 if the clock is before it.
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Random identifier such as `stream-3f9a0c1d22e4b507`.
#[must_use]
pub fn random_id(prefix: &str) -> String {
    format!("{prefix}-{:016x}", OsRng.next_u64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_prefixed_and_distinct() {
        let a = random_id("track");
        let b = random_id("track");
        assert!(a.starts_with("track-"));
        assert_eq!(a.len(), "track-".len() + 16);
        assert_ne!(a, b);
    }
}
