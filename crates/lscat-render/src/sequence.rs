#![forbid(unsafe_code)]

//! Render sequencers.
//!
//! A sequencer is a suspended rendering process. It is primed once, then
//! resumed with exactly one item at a time; each resumption performs one
//! layout lookup and one render call and returns, leaving the sequencer
//! suspended until the next item arrives.
//!
//! Sequencers keep their cursor unsynchronised: the completion tracker is the
//! only caller and already serialises every resumption.
//!
//! # Contract
//!
//! | Call | Precondition | Violation |
//! |------|--------------|-----------|
//! | `prime` | not yet primed | [`ContractViolation::AlreadyPrimed`] |
//! | `resume` | primed | [`ContractViolation::NotPrimed`] |
//! | `resume` | fewer than `expected_total` items consumed | [`ContractViolation::Exhausted`] |
//! | `resume` | item in range and in canonical order | `OutOfRange` / `OutOfOrder` / ... |

use lscat_core::{ItemId, SequenceNumber};

use crate::error::{ContractViolation, SequenceError};
use crate::grid::GridSequence;
use crate::grouped::GroupedSequence;
use crate::painter::Painter;

/// A cooperative, resumable render process.
pub trait Sequencer {
    /// Establish the initial canvas state. Must be called exactly once,
    /// before the first [`resume`](Self::resume).
    fn prime(&mut self) -> Result<(), SequenceError>;

    /// Place and render one item, then suspend.
    ///
    /// The item counts as consumed even when rendering fails, so a render
    /// error never shifts the placement of later items.
    fn resume(&mut self, item: &ItemId) -> Result<(), SequenceError>;

    /// Number of items this sequencer will accept.
    fn expected_total(&self) -> usize;

    /// Number of items consumed so far.
    fn consumed(&self) -> usize;

    fn is_exhausted(&self) -> bool {
        self.consumed() >= self.expected_total()
    }
}

impl<S: Sequencer + ?Sized> Sequencer for Box<S> {
    fn prime(&mut self) -> Result<(), SequenceError> {
        (**self).prime()
    }

    fn resume(&mut self, item: &ItemId) -> Result<(), SequenceError> {
        (**self).resume(item)
    }

    fn expected_total(&self) -> usize {
        (**self).expected_total()
    }

    fn consumed(&self) -> usize {
        (**self).consumed()
    }
}

/// Priming and exhaustion bookkeeping shared by both sequencers.
///
/// Accepts the positions `first..end`, one item per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lifecycle {
    primed: bool,
    consumed: usize,
    first: usize,
    end: usize,
}

impl Lifecycle {
    pub(crate) const fn new(total: usize) -> Self {
        Self::window(0, total)
    }

    /// Bookkeeping for the positions `first..end`; empty if `end <= first`.
    pub(crate) const fn window(first: usize, end: usize) -> Self {
        Self {
            primed: false,
            consumed: 0,
            first,
            end: if end < first { first } else { end },
        }
    }

    pub(crate) fn prime(&mut self) -> Result<(), ContractViolation> {
        if self.primed {
            return Err(ContractViolation::AlreadyPrimed);
        }
        self.primed = true;
        Ok(())
    }

    /// Check that one more item may be consumed and that `seq` is in range.
    pub(crate) fn admit(&self, seq: SequenceNumber) -> Result<(), ContractViolation> {
        if !self.primed {
            return Err(ContractViolation::NotPrimed);
        }
        if self.consumed >= self.total() {
            return Err(ContractViolation::Exhausted {
                total: self.total(),
            });
        }
        if !(self.first..self.end).contains(&seq.get()) {
            return Err(ContractViolation::OutOfRange {
                seq,
                total: self.end,
            });
        }
        Ok(())
    }

    pub(crate) fn consume(&mut self) {
        self.consumed += 1;
    }

    #[inline]
    pub(crate) fn consumed(&self) -> usize {
        self.consumed
    }

    /// Position of the next item in ascending order.
    #[inline]
    pub(crate) fn next_position(&self) -> usize {
        self.first + self.consumed
    }

    /// Number of items accepted.
    #[inline]
    pub(crate) fn total(&self) -> usize {
        self.end - self.first
    }
}

/// The sequencer chosen for a batch.
#[derive(Debug)]
pub enum BatchSequence<P> {
    Grid(GridSequence<P>),
    Grouped(GroupedSequence<P>),
}

impl<P> BatchSequence<P> {
    pub fn painter(&self) -> &P {
        match self {
            Self::Grid(seq) => seq.painter(),
            Self::Grouped(seq) => seq.painter(),
        }
    }
}

impl<P: Painter> Sequencer for BatchSequence<P> {
    fn prime(&mut self) -> Result<(), SequenceError> {
        match self {
            Self::Grid(seq) => seq.prime(),
            Self::Grouped(seq) => seq.prime(),
        }
    }

    fn resume(&mut self, item: &ItemId) -> Result<(), SequenceError> {
        match self {
            Self::Grid(seq) => seq.resume(item),
            Self::Grouped(seq) => seq.resume(item),
        }
    }

    fn expected_total(&self) -> usize {
        match self {
            Self::Grid(seq) => seq.expected_total(),
            Self::Grouped(seq) => seq.expected_total(),
        }
    }

    fn consumed(&self) -> usize {
        match self {
            Self::Grid(seq) => seq.consumed(),
            Self::Grouped(seq) => seq.consumed(),
        }
    }
}

impl<P> From<GridSequence<P>> for BatchSequence<P> {
    fn from(seq: GridSequence<P>) -> Self {
        Self::Grid(seq)
    }
}

impl<P> From<GroupedSequence<P>> for BatchSequence<P> {
    fn from(seq: GroupedSequence<P>) -> Self {
        Self::Grouped(seq)
    }
}
