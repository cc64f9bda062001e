//! The call manager and everything it exposes to callers: configuration,
//! events, listeners and errors.
pub mod call_config;
pub mod call_error;
pub mod call_manager;
mod constants;
pub mod event_bus;
pub mod events;
pub(crate) mod manager_input;
pub mod session;

pub use call_config::{CallConfig, QualitySettings};
pub use call_error::{CallError, ErrorType};
pub use call_manager::CallManager;
pub use event_bus::{EventBus, ListenerId};
pub use events::{CallEvent, EventKind};
pub use session::Session;
