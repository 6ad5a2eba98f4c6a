#![forbid(unsafe_code)]

//! Worker dispatch: one thread per remote item.
//!
//! Each worker fetches its item through a [`Fetch`] implementation and, on
//! success, reports the local item id to the tracker exactly once. Workers
//! know nothing about each other or about display order; the tracker does
//! all the ordering. Failed fetches are logged and not retried.

use std::fmt;
use std::thread;

use lscat_core::{ItemId, debug, warn};
use lscat_render::Sequencer;

use crate::debug_trace;
use crate::error::TrackerError;
use crate::tracker::Tracker;

/// One item to fetch: where it lives remotely and the id it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub remote: String,
    pub local: ItemId,
}

impl Job {
    pub fn new(remote: impl Into<String>, local: ItemId) -> Self {
        Self {
            remote: remote.into(),
            local,
        }
    }
}

/// Downloads one item to local storage.
pub trait Fetch: Sync {
    type Error: fmt::Display;

    /// Materialize `job.remote` as `job.local`. Blocks until done.
    fn fetch(&self, job: &Job) -> Result<(), Self::Error>;
}

/// What happened to a dispatched batch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Jobs whose fetch succeeded (and were reported to the tracker).
    pub fetched: usize,
    /// Jobs whose fetch failed.
    pub fetch_failures: usize,
    /// Errors the tracker returned to individual workers.
    pub tracker_errors: Vec<TrackerError>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.fetch_failures == 0 && self.tracker_errors.is_empty()
    }
}

enum WorkerOutcome {
    Fetched(Option<TrackerError>),
    FetchFailed,
}

/// Fetch every job on its own thread and feed completions to `tracker`.
///
/// Returns once every worker has finished. A panicking worker is re-raised
/// on the calling thread.
pub fn dispatch<F, S>(jobs: Vec<Job>, fetcher: &F, tracker: &Tracker<S>) -> DispatchReport
where
    F: Fetch + ?Sized,
    S: Sequencer + Send,
{
    debug!(jobs = jobs.len(), "dispatching workers");
    thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| scope.spawn(move || run_job(&job, fetcher, tracker)))
            .collect();

        let mut report = DispatchReport::default();
        for handle in handles {
            match handle.join() {
                Ok(WorkerOutcome::Fetched(error)) => {
                    report.fetched += 1;
                    report.tracker_errors.extend(error);
                }
                Ok(WorkerOutcome::FetchFailed) => report.fetch_failures += 1,
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        report
    })
}

fn run_job<F, S>(job: &Job, fetcher: &F, tracker: &Tracker<S>) -> WorkerOutcome
where
    F: Fetch + ?Sized,
    S: Sequencer,
{
    if let Err(e) = fetcher.fetch(job) {
        warn!(remote = %job.remote, local = %job.local, error = %e, "fetch failed");
        return WorkerOutcome::FetchFailed;
    }
    debug_trace!("fetched {}", job.local);
    match tracker.update_item(job.local.clone()) {
        Ok(_) => WorkerOutcome::Fetched(None),
        Err(e) => WorkerOutcome::Fetched(Some(e)),
    }
}
