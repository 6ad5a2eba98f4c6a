#![forbid(unsafe_code)]

//! Rendering for lscat.
//!
//! # Key Components
//!
//! - [`Painter`] - the blocking render primitive
//! - [`TerminalPainter`] - paints thumbnails through kitty, iTerm2, or ASCII
//! - [`Sequencer`] - a resumable render process, primed once, resumed per item
//! - [`GridSequence`] / [`GroupedSequence`] - the two placement strategies
//! - [`BatchSequence`] - whichever of the two a batch was built with

pub mod error;
pub mod grid;
pub mod grouped;
pub mod image;
pub mod painter;
pub mod sequence;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use error::{ContractViolation, RenderError, SequenceError};
pub use grid::GridSequence;
pub use grouped::GroupedSequence;
pub use image::{DetectionHints, ImageProtocol, detect_protocol};
pub use painter::{Painter, TerminalPainter};
pub use sequence::{BatchSequence, Sequencer};
