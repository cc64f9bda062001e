use std::time::Duration;

use crate::{
    config::Config,
    core::constants::{DEFAULT_DATA_CHANNEL_LABEL, DEFAULT_STATS_INTERVAL_SECS, DEFAULT_STUN_SERVERS},
    media::{AudioConstraints, DisplayConstraints, MediaConstraints, VideoConstraints},
    quality_controller::constants::{
        DEFAULT_INITIAL_BITRATE, DEFAULT_MAX_BITRATE, DEFAULT_MIN_BITRATE,
    },
    transport::{IceServer, TransportConfig},
};

/// Adaptive bitrate settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualitySettings {
    pub adaptive_bitrate: bool,
    pub initial_bitrate: u32,
    pub min_bitrate: u32,
    pub max_bitrate: u32,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            adaptive_bitrate: true,
            initial_bitrate: DEFAULT_INITIAL_BITRATE,
            min_bitrate: DEFAULT_MIN_BITRATE,
            max_bitrate: DEFAULT_MAX_BITRATE,
        }
    }
}

/// Typed settings for one `CallManager`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallConfig {
    pub ice_servers: Vec<IceServer>,
    pub media: MediaConstraints,
    pub display: DisplayConstraints,
    pub stats_interval: Duration,
    pub data_channel_label: String,
    pub quality: QualitySettings,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            ice_servers: DEFAULT_STUN_SERVERS
                .iter()
                .map(|url| IceServer::stun(*url))
                .collect(),
            media: MediaConstraints::default(),
            display: DisplayConstraints::default(),
            stats_interval: Duration::from_secs(DEFAULT_STATS_INTERVAL_SECS),
            data_channel_label: DEFAULT_DATA_CHANNEL_LABEL.to_owned(),
            quality: QualitySettings::default(),
        }
    }
}

impl CallConfig {
    /// Reads the `[Ice]`, `[Media]`, `[Stats]`, `[DataChannel]` and
    /// `[Quality]` sections. Missing or unparsable values keep their defaults.
    #[must_use]
    pub fn from_config(cfg: &Config) -> Self {
        let d = Self::default();

        let ice_servers = cfg
            .get_non_empty("Ice", "servers")
            .map(|list| {
                parse_ice_servers(list, cfg.get("Ice", "username"), cfg.get("Ice", "credential"))
            })
            .filter(|servers| !servers.is_empty())
            .unwrap_or(d.ice_servers);

        let cam = VideoConstraints::camera();
        let camera = VideoConstraints {
            ideal_width: cfg.get_parsed("Media", "video_width").unwrap_or(cam.ideal_width),
            ideal_height: cfg.get_parsed("Media", "video_height").unwrap_or(cam.ideal_height),
            ideal_frame_rate: cfg
                .get_parsed("Media", "video_fps")
                .unwrap_or(cam.ideal_frame_rate),
        };
        let audio_default = AudioConstraints::default();
        let audio = AudioConstraints {
            echo_cancellation: cfg
                .get_bool("Media", "echo_cancellation")
                .unwrap_or(audio_default.echo_cancellation),
            noise_suppression: cfg
                .get_bool("Media", "noise_suppression")
                .unwrap_or(audio_default.noise_suppression),
            auto_gain_control: cfg
                .get_bool("Media", "auto_gain_control")
                .unwrap_or(audio_default.auto_gain_control),
        };
        let screen = d.display.video;
        let display = DisplayConstraints {
            video: VideoConstraints {
                ideal_width: cfg.get_parsed("Media", "screen_width").unwrap_or(screen.ideal_width),
                ideal_height: cfg
                    .get_parsed("Media", "screen_height")
                    .unwrap_or(screen.ideal_height),
                ideal_frame_rate: cfg
                    .get_parsed("Media", "screen_fps")
                    .unwrap_or(screen.ideal_frame_rate),
            },
            audio: cfg.get_bool("Media", "screen_audio").unwrap_or(d.display.audio),
        };

        let stats_interval = cfg
            .get_parsed::<u64>("Stats", "interval_secs")
            .filter(|s| *s > 0)
            .map_or(d.stats_interval, Duration::from_secs);

        let data_channel_label = cfg
            .get_non_empty("DataChannel", "label")
            .map_or(d.data_channel_label, str::to_owned);

        let quality = QualitySettings {
            adaptive_bitrate: cfg
                .get_bool("Quality", "adaptive_bitrate")
                .unwrap_or(d.quality.adaptive_bitrate),
            initial_bitrate: cfg
                .get_parsed("Quality", "initial_bitrate")
                .unwrap_or(d.quality.initial_bitrate),
            min_bitrate: cfg
                .get_parsed("Quality", "min_bitrate")
                .unwrap_or(d.quality.min_bitrate),
            max_bitrate: cfg
                .get_parsed("Quality", "max_bitrate")
                .unwrap_or(d.quality.max_bitrate),
        };

        Self {
            ice_servers,
            media: MediaConstraints {
                video: Some(camera),
                audio: Some(audio),
            },
            display,
            stats_interval,
            data_channel_label,
            quality,
        }
    }

    #[must_use]
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            ice_servers: self.ice_servers.clone(),
        }
    }
}

/// Comma-separated URLs, one `IceServer` each. Credentials only go on TURN entries.
fn parse_ice_servers(list: &str, username: Option<&str>, credential: Option<&str>) -> Vec<IceServer> {
    list.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(|url| {
            let mut server = IceServer::stun(url);
            if server.is_turn() {
                server.username = username.filter(|s| !s.is_empty()).map(str::to_owned);
                server.credential = credential.filter(|s| !s.is_empty()).map(str::to_owned);
            }
            server
        })
        .collect()
}
