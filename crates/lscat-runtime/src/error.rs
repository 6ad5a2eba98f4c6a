#![forbid(unsafe_code)]

//! Errors surfaced by the tracker and by batch assembly.

use std::fmt;

use lscat_core::{ParseError, SequenceNumber};
use lscat_layout::OrderError;
use lscat_render::{ContractViolation, RenderError, SequenceError};

/// Error returned to the caller of [`Tracker::update`](crate::Tracker::update).
///
/// Only [`Contract`](Self::Contract) and [`Aborted`](Self::Aborted) mean the
/// batch is dead; the other variants leave the tracker usable.
#[derive(Debug)]
pub enum TrackerError {
    /// The completed item's name carries no sequence number.
    MalformedId(ParseError),
    /// The render primitive failed. The item still counts as displayed.
    Render {
        /// `None` when the failure happened while priming.
        seq: Option<SequenceNumber>,
        source: RenderError,
    },
    /// The sequencer rejected an item; the batch has been aborted.
    Contract(ContractViolation),
    /// An earlier contract violation aborted the batch.
    Aborted,
    /// The order handed to the tracker lists a position twice.
    DuplicateOrder(SequenceNumber),
}

impl TrackerError {
    /// Whether the tracker can still make progress after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedId(_) | Self::Render { .. })
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedId(e) => write!(f, "malformed item id: {e}"),
            Self::Render {
                seq: Some(seq),
                source,
            } => write!(f, "render of item {seq} failed: {source}"),
            Self::Render { seq: None, source } => write!(f, "priming render failed: {source}"),
            Self::Contract(v) => write!(f, "batch aborted: {v}"),
            Self::Aborted => write!(f, "batch was aborted by an earlier contract violation"),
            Self::DuplicateOrder(seq) => write!(f, "order lists item {seq} more than once"),
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedId(e) => Some(e),
            Self::Render { source, .. } => Some(source),
            Self::Contract(v) => Some(v),
            Self::Aborted | Self::DuplicateOrder(_) => None,
        }
    }
}

impl From<ParseError> for TrackerError {
    fn from(e: ParseError) -> Self {
        Self::MalformedId(e)
    }
}

impl From<ContractViolation> for TrackerError {
    fn from(v: ContractViolation) -> Self {
        Self::Contract(v)
    }
}

impl From<SequenceError> for TrackerError {
    fn from(e: SequenceError) -> Self {
        match e {
            SequenceError::Render(source) => Self::Render { seq: None, source },
            SequenceError::Contract(v) => Self::Contract(v),
        }
    }
}

/// Failure to assemble a batch.
#[derive(Debug)]
pub enum BatchError {
    Order(OrderError),
    Tracker(TrackerError),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order(e) => write!(f, "invalid batch order: {e}"),
            Self::Tracker(e) => write!(f, "cannot start batch: {e}"),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Order(e) => Some(e),
            Self::Tracker(e) => Some(e),
        }
    }
}

impl From<OrderError> for BatchError {
    fn from(e: OrderError) -> Self {
        Self::Order(e)
    }
}

impl From<TrackerError> for BatchError {
    fn from(e: TrackerError) -> Self {
        Self::Tracker(e)
    }
}
