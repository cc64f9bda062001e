//! Local media: shared track handles, streams, capture constraints and the
//! `MediaDevices` seam that produces them.
pub mod constraints;
pub mod local_media;
pub mod media_devices;
pub mod media_error;
pub mod media_stream;
pub mod media_track;

pub use constraints::{AudioConstraints, DisplayConstraints, MediaConstraints, VideoConstraints};
pub use local_media::LocalMedia;
pub use media_devices::MediaDevices;
pub use media_error::MediaError;
pub use media_stream::MediaStream;
pub use media_track::{MediaTrack, TrackKind, TrackRef, TrackSettings, TrackState};
