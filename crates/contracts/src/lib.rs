//! # Contracts
//!
//! Shared interface contracts between the notifier crates: detection events,
//! the capture handler and event source traits, configuration sections and
//! the common error type.
//! All business crates depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Event timestamps are the DVR's local wall-clock time as printed in the
//!   alert email (`chrono::NaiveDateTime`, no timezone)

mod config;
mod error;
mod event;
mod event_source;
mod handler;

pub use config::*;
pub use error::*;
pub use event::*;
pub use event_source::{EventSource, LocalEventSource};
pub use handler::{handler_fn, CaptureHandler, HandlerFn, LocalCaptureHandler};
