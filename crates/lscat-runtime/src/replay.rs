#![forbid(unsafe_code)]

//! Replay of a batch that is already on disk.
//!
//! The tracker decides what is shown: a tracker built for a window of the
//! batch (see [`Batch::with_window`](crate::Batch::with_window)) redisplays
//! only that window and counts every other stored item as outside it.

use std::fs;
use std::io;
use std::path::Path;

use lscat_core::{ItemId, SequenceNumber, debug, warn};
use lscat_render::Sequencer;

use crate::error::TrackerError;
use crate::tracker::{IgnoreReason, Tracker, UpdateOutcome};

/// Item files found in a batch directory, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredBatch {
    pub items: Vec<ItemId>,
    /// Visible files whose name has no sequence prefix.
    pub skipped: usize,
}

impl StoredBatch {
    /// Scan `dir` for item files.
    ///
    /// Hidden files (including the header count sidecar) and subdirectories
    /// are not items.
    pub fn scan(dir: &Path) -> io::Result<Self> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort_unstable();

        let mut batch = Self::default();
        for name in names {
            match ItemId::parse(name) {
                Ok(item) => batch.items.push(item),
                Err(e) => {
                    debug!(error = %e, "skipping file without sequence prefix");
                    batch.skipped += 1;
                }
            }
        }
        Ok(batch)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// One past the highest stored position; the size of the batch the
    /// files were downloaded for, as far as the directory can tell.
    pub fn span(&self) -> usize {
        self.items
            .iter()
            .map(|item| item.seq().get() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// What [`show_instant`] fed to the tracker.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Files reported to the tracker.
    pub delivered: usize,
    /// Files skipped because their name has no sequence prefix.
    pub skipped: usize,
    /// Files whose position is not displayed by this tracker.
    pub outside: usize,
    /// The position the tracker still waits for once every file was
    /// delivered: the first gap in the stored batch.
    pub waiting_for: Option<SequenceNumber>,
    /// Errors the tracker returned.
    pub tracker_errors: Vec<TrackerError>,
}

/// Report every item file in `dir` to `tracker` as if it had just finished
/// downloading. Files are delivered in name order, which for a complete
/// batch drains in one pass.
pub fn show_instant<S: Sequencer>(dir: &Path, tracker: &Tracker<S>) -> io::Result<ReplayReport> {
    Ok(replay(StoredBatch::scan(dir)?, tracker))
}

/// Deliver an already-scanned batch to `tracker`.
pub fn replay<S: Sequencer>(batch: StoredBatch, tracker: &Tracker<S>) -> ReplayReport {
    let mut report = ReplayReport {
        skipped: batch.skipped,
        ..ReplayReport::default()
    };
    for item in batch.items {
        report.delivered += 1;
        match tracker.update_item(item) {
            Ok(UpdateOutcome::Ignored(IgnoreReason::NotInBatch)) => report.outside += 1,
            Ok(_) => {}
            Err(e) => report.tracker_errors.push(e),
        }
    }
    report.waiting_for = tracker.waiting_for();
    if let Some(seq) = report.waiting_for {
        warn!(%seq, "stored batch has a gap, display stalled");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Batch;
    use lscat_core::{Config, DisplayMode};
    use lscat_render::testing::RecordingPainter;

    fn stored(names: impl IntoIterator<Item = String>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        dir
    }

    fn grid() -> Config {
        Config::default()
            .with_canvas(100, 20)
            .with_mode(DisplayMode::Grid)
            .with_annotate(false)
    }

    #[test]
    fn scan_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["002_c.png", "000_a.png", "001_b.gif", ".lscat", "readme"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("003_dir")).unwrap();

        let batch = StoredBatch::scan(dir.path()).unwrap();
        let names: Vec<&str> = batch.items.iter().map(ItemId::as_str).collect();
        assert_eq!(names, ["000_a.png", "001_b.gif", "002_c.png"]);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn empty_dir_scans_empty() {
        let dir = tempfile::tempdir().unwrap();
        let batch = StoredBatch::scan(dir.path()).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.span(), 0);
    }

    #[test]
    fn scrolled_window_redisplays_only_its_positions() {
        let dir = stored((0..30).map(|n| format!("{n:03}_p.png")));
        let painter = RecordingPainter::new();
        let tracker = Batch::new(grid(), dir.path(), 30)
            .with_window(10..30)
            .tracker(painter.clone())
            .unwrap();

        let report = show_instant(dir.path(), &tracker).unwrap();

        assert!(tracker.is_finished());
        assert_eq!(report.delivered, 30);
        assert_eq!(report.outside, 10);
        assert_eq!(report.waiting_for, None);
        assert!(report.tracker_errors.is_empty());
        let expected: Vec<String> = (10..30).map(|n| format!("{n:03}_p.png")).collect();
        assert_eq!(painter.rendered(), expected);
        assert_eq!(painter.positions()[0], (2, 0));
        assert_eq!(painter.positions()[5], (2, 9));
    }

    #[test]
    fn gap_is_reported_as_the_stalled_position() {
        let dir = stored(["000_a.png", "001_b.png", "005_f.png"].map(String::from));
        let batch = StoredBatch::scan(dir.path()).unwrap();
        let painter = RecordingPainter::new();
        let tracker = Batch::new(grid(), dir.path(), batch.span())
            .tracker(painter.clone())
            .unwrap();

        let report = replay(batch, &tracker);

        assert_eq!(report.outside, 0);
        assert_eq!(report.waiting_for, Some(SequenceNumber::new(2)));
        assert_eq!(painter.rendered(), ["000_a.png", "001_b.png"]);
        assert_eq!(tracker.pending(), 1);
    }

    #[test]
    fn span_covers_gaps() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["000_a.png", "001_b.png", "005_f.png"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let batch = StoredBatch::scan(dir.path()).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.span(), 6);
    }
}
