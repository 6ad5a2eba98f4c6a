#![forbid(unsafe_code)]

//! Completion tracker: the thread-safe front door of a batch.
//!
//! Workers call [`Tracker::update`] once per finished download, from any
//! thread and in any order. The tracker buffers completions that arrive early
//! and resumes its [`Sequencer`] with every item whose turn has come, so the
//! sequencer sees items in exactly the order the tracker was built with.
//!
//! # State machine
//!
//! ```text
//!            update (front missing)
//!          +----------------------+
//!          v                      |
//!  new -> Idle --update--> Draining --queue empty--> Finished
//!                              |
//!                              +--contract violation--> Aborted
//! ```
//!
//! `Draining` is only observable from inside the exclusive section; callers
//! see `Idle`, `Finished` or `Aborted`.
//!
//! # Invariants
//!
//! 1. A sequence number is in the order queue and the pending map at most
//!    once each, and never after it has been drained.
//! 2. An item is handed to the sequencer iff it was at the front of the queue
//!    while pending.
//! 3. Every resumption happens under the tracker lock, so no two renders ever
//!    overlap.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use lscat_core::{ItemId, SequenceNumber, debug, error, info, warn};
use lscat_render::{SequenceError, Sequencer};

use crate::debug_trace;
use crate::error::TrackerError;

/// Observable tracker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Waiting for the item at the front of the queue.
    Idle,
    /// Resuming the sequencer with available items.
    Draining,
    /// Every item has been drained; updates are ignored.
    Finished,
    /// A contract violation ended the batch.
    Aborted,
}

/// Why an update did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The batch has already finished.
    Finished,
    /// This item was displayed earlier.
    AlreadyDrained,
    /// The item's sequence number is not part of this batch.
    NotInBatch,
}

/// What a successful [`Tracker::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The item was buffered; an earlier item is still missing.
    Buffered,
    /// This many items (including the one just delivered) were displayed.
    Drained(usize),
    /// The update was a no-op.
    Ignored(IgnoreReason),
}

#[derive(Debug)]
struct Inner<S> {
    order: VecDeque<SequenceNumber>,
    /// Every position of the batch.
    members: HashSet<SequenceNumber>,
    /// Positions still in `order`.
    remaining: HashSet<SequenceNumber>,
    pending: HashMap<SequenceNumber, ItemId>,
    sequencer: S,
    state: TrackerState,
    drained: usize,
    render_failures: usize,
}

/// Releases out-of-order completions to a sequencer in order.
#[derive(Debug)]
pub struct Tracker<S> {
    inner: Mutex<Inner<S>>,
}

impl<S: Sequencer> Tracker<S> {
    /// Prime `sequencer` and start tracking `order`.
    ///
    /// An empty order yields a tracker that is already
    /// [`Finished`](TrackerState::Finished).
    ///
    /// # Errors
    ///
    /// [`TrackerError::DuplicateOrder`] if `order` repeats a position, or the
    /// sequencer's priming error.
    pub fn new<I>(order: I, mut sequencer: S) -> Result<Self, TrackerError>
    where
        I: IntoIterator,
        I::Item: Into<SequenceNumber>,
    {
        let order: VecDeque<SequenceNumber> = order.into_iter().map(Into::into).collect();
        let mut members = HashSet::with_capacity(order.len());
        for &seq in &order {
            if !members.insert(seq) {
                return Err(TrackerError::DuplicateOrder(seq));
            }
        }

        sequencer.prime()?;

        let state = if order.is_empty() {
            TrackerState::Finished
        } else {
            TrackerState::Idle
        };
        info!(items = order.len(), "tracker started");
        debug_trace!("tracker started with {} items", order.len());

        Ok(Self {
            inner: Mutex::new(Inner {
                remaining: members.clone(),
                members,
                order,
                pending: HashMap::new(),
                sequencer,
                state,
                drained: 0,
                render_failures: 0,
            }),
        })
    }

    /// Report that the item named `id` has finished downloading.
    ///
    /// Never waits for a future completion: returns once this item has been
    /// buffered and every item that became displayable has been rendered.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::MalformedId`] if `id` has no sequence prefix; no
    ///   state changes.
    /// - [`TrackerError::Render`] for the first render failure of this drain.
    ///   The failed item is still counted as displayed.
    /// - [`TrackerError::Contract`] if the sequencer rejected an item. The
    ///   batch is aborted.
    /// - [`TrackerError::Aborted`] if an earlier call aborted the batch.
    pub fn update(&self, id: &str) -> Result<UpdateOutcome, TrackerError> {
        let item = ItemId::parse(id)?;
        self.update_item(item)
    }

    /// [`update`](Self::update) with an already-parsed id.
    pub fn update_item(&self, item: ItemId) -> Result<UpdateOutcome, TrackerError> {
        let mut inner = self.lock();
        match inner.state {
            TrackerState::Finished => {
                debug!(item = %item, "ignoring completion after batch finished");
                return Ok(UpdateOutcome::Ignored(IgnoreReason::Finished));
            }
            TrackerState::Aborted => return Err(TrackerError::Aborted),
            TrackerState::Idle | TrackerState::Draining => {}
        }

        let seq = item.seq();
        if !inner.remaining.contains(&seq) {
            let reason = if inner.members.contains(&seq) {
                IgnoreReason::AlreadyDrained
            } else {
                IgnoreReason::NotInBatch
            };
            debug!(item = %item, ?reason, "ignoring completion");
            return Ok(UpdateOutcome::Ignored(reason));
        }

        // A repeated completion for a pending item replaces the earlier one.
        inner.pending.insert(seq, item);
        inner.drain()
    }

    /// Read the sequencer under the tracker lock.
    pub fn with_sequencer<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock().sequencer)
    }

    pub fn into_sequencer(self) -> S {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .sequencer
    }
}

impl<S> Tracker<S> {
    pub fn state(&self) -> TrackerState {
        self.lock().state
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state() == TrackerState::Finished
    }

    /// Positions not yet displayed.
    pub fn remaining(&self) -> usize {
        self.lock().order.len()
    }

    /// The position the tracker is waiting for, while it is still running.
    pub fn waiting_for(&self) -> Option<SequenceNumber> {
        let inner = self.lock();
        match inner.state {
            TrackerState::Idle | TrackerState::Draining => inner.order.front().copied(),
            TrackerState::Finished | TrackerState::Aborted => None,
        }
    }

    /// Completions buffered behind a missing item.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Items handed to the sequencer so far, including failed renders.
    pub fn drained(&self) -> usize {
        self.lock().drained
    }

    pub fn render_failures(&self) -> usize {
        self.lock().render_failures
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Sequencer> Inner<S> {
    /// Resume the sequencer for as long as the front of the queue is pending.
    fn drain(&mut self) -> Result<UpdateOutcome, TrackerError> {
        self.state = TrackerState::Draining;
        let mut drained = 0;
        let mut first_failure = None;

        while let Some(&front) = self.order.front() {
            let Some(item) = self.pending.remove(&front) else {
                break;
            };
            self.order.pop_front();
            self.remaining.remove(&front);
            self.drained += 1;
            drained += 1;
            debug_trace!("draining {}", item);

            match self.sequencer.resume(&item) {
                Ok(()) => {
                    debug!(seq = %front, "drained");
                }
                Err(SequenceError::Render(source)) => {
                    warn!(seq = %front, error = %source, "render failed");
                    self.render_failures += 1;
                    if first_failure.is_none() {
                        first_failure = Some(TrackerError::Render {
                            seq: Some(front),
                            source,
                        });
                    }
                }
                Err(SequenceError::Contract(violation)) => {
                    error!(seq = %front, %violation, "sequencer contract violated, aborting batch");
                    self.state = TrackerState::Aborted;
                    self.pending.clear();
                    return Err(TrackerError::Contract(violation));
                }
            }
        }

        if self.order.is_empty() {
            info!(drained = self.drained, failures = self.render_failures, "batch finished");
            debug_trace!("batch finished");
            self.state = TrackerState::Finished;
        } else {
            self.state = TrackerState::Idle;
        }

        match first_failure {
            Some(err) => Err(err),
            None if drained == 0 => Ok(UpdateOutcome::Buffered),
            None => Ok(UpdateOutcome::Drained(drained)),
        }
    }
}
