pub mod constants;
pub mod quality_controller;
pub use quality_controller::{NetworkMetrics, QualityController};
