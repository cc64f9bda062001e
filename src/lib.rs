//! meshcall coordinates a full-mesh group call: one peer connection per
//! remote participant, a shared local camera/microphone stream, screen
//! sharing, JSON data channels, periodic statistics and adaptive video
//! bitrate.
//!
//! The platform pieces sit behind traits: `MediaDevices` captures media and
//! `TransportFactory` builds peer transports. The `loopback` module provides
//! an in-process implementation of both, so two or more managers in one
//! process can hold a real call with each other.

/// Handles configuration loading and management.
pub mod config;
/// The call manager, its configuration, events and listener registry.
pub mod core;
/// Logging utilities shared by every component.
pub mod log;
/// In-process transport and capture backends.
pub mod loopback;
/// Tracks, streams, capture constraints and the capture seam.
pub mod media;
/// Real camera and microphone capture.
#[cfg(feature = "native-devices")]
pub mod native;
/// Per-remote-participant connection state.
pub mod peer;
/// Loss/RTT driven video bitrate adaptation.
pub mod quality_controller;
/// Raw transport statistics and the per-peer summary built from them.
pub mod stats;
/// The peer transport seam: SDP, ICE candidates, senders and data channels.
pub mod transport;
pub mod utils;

pub use crate::core::{CallConfig, CallError, CallEvent, CallManager, EventKind, Session};
