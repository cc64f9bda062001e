//! Real capture devices behind the `native-devices` feature: `OpenCV` for the
//! camera and `cpal` for the microphone.
pub mod camera_error;
pub mod camera_probe;
pub mod microphone_probe;
pub mod native_devices;

pub use native_devices::NativeDevices;
