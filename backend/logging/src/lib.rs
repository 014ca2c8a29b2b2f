//! Structured logging for texspeak.
//!
//! Console plus rolling NDJSON file output, and per-item conversion events.

pub mod event_logger;
pub mod logger;

pub use event_logger::{ConversionEvent, ConversionEventLogger, ConversionLogEntry, EVENT_TARGET};
pub use logger::init_logger;
