#![forbid(unsafe_code)]

//! Render and sequencing errors.
//!
//! | Error | Cause | Recovery |
//! |-------|-------|----------|
//! | [`RenderError`] | The render primitive failed (I/O, decode) | Item skipped, batch continues |
//! | [`ContractViolation`] | A sequencer was driven out of order or past its end | None; the batch is aborted |

use std::fmt;
use std::io;

use lscat_core::SequenceNumber;

use crate::image::ImageError;

/// The render primitive failed for one item.
#[derive(Debug)]
pub enum RenderError {
    /// Reading the item or writing to the terminal failed.
    Io(io::Error),
    /// The item could not be decoded or re-encoded as an image.
    Image(ImageError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "render I/O error: {e}"),
            Self::Image(e) => write!(f, "render image error: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Image(e) => Some(e),
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ImageError> for RenderError {
    fn from(e: ImageError) -> Self {
        Self::Image(e)
    }
}

/// A sequencer was resumed in a way its driver guarantees never happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
    /// Resumed with an item before the priming call.
    NotPrimed,
    /// Primed a second time.
    AlreadyPrimed,
    /// Resumed after every expected item was consumed.
    Exhausted { total: usize },
    /// Sequence number outside the accepted positions, which end at `total`.
    OutOfRange { seq: SequenceNumber, total: usize },
    /// Item arrived out of canonical order.
    OutOfOrder {
        expected: SequenceNumber,
        got: SequenceNumber,
    },
    /// A header arrived while the previous group still lacked children.
    UnexpectedHeader {
        seq: SequenceNumber,
        missing_children: usize,
    },
    /// A child arrived with no open group slot.
    UnexpectedChild { seq: SequenceNumber },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPrimed => write!(f, "sequencer resumed before priming"),
            Self::AlreadyPrimed => write!(f, "sequencer primed twice"),
            Self::Exhausted { total } => {
                write!(f, "sequencer resumed after all {total} items were consumed")
            }
            Self::OutOfRange { seq, total } => {
                write!(f, "sequence number {seq} outside batch of {total} items")
            }
            Self::OutOfOrder { expected, got } => {
                write!(f, "expected item {expected}, got {got}")
            }
            Self::UnexpectedHeader {
                seq,
                missing_children,
            } => write!(
                f,
                "header {seq} arrived with {missing_children} children of the previous group missing"
            ),
            Self::UnexpectedChild { seq } => {
                write!(f, "child {seq} arrived with no open group")
            }
        }
    }
}

impl std::error::Error for ContractViolation {}

/// Outcome of a failed sequencer resumption.
#[derive(Debug)]
pub enum SequenceError {
    Render(RenderError),
    Contract(ContractViolation),
}

impl SequenceError {
    /// Whether the batch can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Render(_))
    }
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(e) => e.fmt(f),
            Self::Contract(e) => write!(f, "sequencer contract violated: {e}"),
        }
    }
}

impl std::error::Error for SequenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            Self::Contract(e) => Some(e),
        }
    }
}

impl From<RenderError> for SequenceError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

impl From<ContractViolation> for SequenceError {
    fn from(e: ContractViolation) -> Self {
        Self::Contract(e)
    }
}
