//! In-process implementations of the media and transport seams. Two
//! managers sharing one `LoopbackNetwork` can call each other without any
//! real devices or sockets.
pub mod loopback_channel;
pub mod loopback_devices;
pub mod loopback_network;
pub mod loopback_sender;
pub mod loopback_transport;
mod sdp;

pub use loopback_channel::LoopbackChannel;
pub use loopback_devices::LoopbackDevices;
pub use loopback_network::{LinkQuality, LoopbackNetwork};
pub use loopback_sender::LoopbackSender;
pub use loopback_transport::{LoopbackFactory, LoopbackTransport};
