use crate::media::TrackKind;

const ENDPOINT_ATTR: &str = "a=x-loopback-endpoint:";

/// Minimal session description naming the local endpoint, one `m=` line per
/// sent track and one for data channels.
pub(crate) fn build_sdp(endpoint: u64, kinds: &[TrackKind], has_channels: bool) -> String {
    let mut sdp = format!(
        "v=0\r\no=- {endpoint} 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n{ENDPOINT_ATTR}{endpoint}\r\n"
    );
    for kind in kinds {
        match kind {
            TrackKind::Audio => sdp.push_str("m=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=rtpmap:111 opus/48000/2\r\n"),
            TrackKind::Video => sdp.push_str("m=video 9 UDP/TLS/RTP/SAVPF 96\r\na=rtpmap:96 H264/90000\r\n"),
        }
    }
    if has_channels {
        sdp.push_str("m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\n");
    }
    sdp
}

/// The endpoint id a description was built for.
pub(crate) fn parse_endpoint(sdp: &str) -> Option<u64> {
    sdp.lines()
        .find_map(|l| l.trim().strip_prefix(ENDPOINT_ATTR))
        .and_then(|id| id.trim().parse().ok())
}

pub(crate) fn host_candidate(endpoint: u64) -> String {
    let port = 40_000 + endpoint % 20_000;
    format!("candidate:1 1 udp 2130706431 127.0.0.1 {port} typ host")
}

pub(crate) fn is_candidate(candidate: &str) -> bool {
    candidate.starts_with("candidate:") && candidate.contains(" typ ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_survives_build_and_parse() {
        let sdp = build_sdp(7, &[TrackKind::Audio, TrackKind::Video], true);
        assert_eq!(parse_endpoint(&sdp), Some(7));
        assert!(sdp.contains("m=video"));
        assert!(sdp.contains("webrtc-datachannel"));
        assert_eq!(parse_endpoint("v=0\r\ns=-\r\n"), None);
        assert_eq!(parse_endpoint("a=x-loopback-endpoint:abc"), None);
    }

    #[test]
    fn candidates() {
        assert!(is_candidate(&host_candidate(3)));
        assert!(!is_candidate("garbage"));
    }
}
