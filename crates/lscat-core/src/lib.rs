#![forbid(unsafe_code)]

//! Core: item identifiers, the per-batch configuration snapshot, and logging.

pub mod config;
pub mod item;
pub mod logging;

pub use config::{CanvasSize, Config, ConfigValueError, DisplayMode};
pub use item::{ItemId, ItemKind, ParseError, SEQUENCE_WIDTH, SequenceNumber};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
