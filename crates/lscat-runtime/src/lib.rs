#![forbid(unsafe_code)]

//! Runtime for lscat: displays a batch of concurrently-fetched items in order.
//!
//! # Key Components
//!
//! - [`Tracker`] - buffers out-of-order completions and drains them in order
//! - [`Batch`] - builds the layout, order, and sequencer for a batch
//! - [`dispatch`] - one worker thread per item, each reporting to the tracker
//! - [`show_instant`] - replays a batch already on disk
//! - [`sidecar`] - persisted header count of grouped batches
//!
//! # Example
//!
//! ```ignore
//! use lscat_core::Config;
//! use lscat_render::TerminalPainter;
//! use lscat_runtime::{Batch, show_instant};
//!
//! let config = Config::from_env();
//! let painter = TerminalPainter::stdout(&config);
//! let tracker = Batch::new(config, "/tmp/batch", 30).tracker(painter)?;
//! show_instant("/tmp/batch".as_ref(), &tracker)?;
//! ```

pub mod batch;
pub mod debug_trace;
pub mod dispatch;
pub mod error;
pub mod replay;
pub mod sidecar;
pub mod tracker;

pub use batch::{Batch, resolve_canvas};
pub use dispatch::{DispatchReport, Fetch, Job, dispatch};
pub use error::{BatchError, TrackerError};
pub use replay::{ReplayReport, StoredBatch, replay, show_instant};
pub use sidecar::{SidecarError, read_header_count, resolve_header_count, write_header_count};
pub use tracker::{IgnoreReason, Tracker, TrackerState, UpdateOutcome};
