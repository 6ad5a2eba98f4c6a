#![forbid(unsafe_code)]

//! lscat public facade crate.
//!
//! Re-exports the pieces needed to display a batch of images in order, plus
//! [`show_dir`] for replaying a batch that is already on disk.

use std::fmt;
use std::io;
use std::ops::Range;
use std::path::Path;

use lscat_core::{DisplayMode, info};

// --- Core re-exports -------------------------------------------------------

pub use lscat_core::{CanvasSize, Config, ItemId, ItemKind, ParseError, SequenceNumber};

// --- Layout re-exports -----------------------------------------------------

pub use lscat_layout::{LayoutTable, OrderError, canonical_order, column_offsets, row_offsets};

// --- Render re-exports -----------------------------------------------------

pub use lscat_render::{
    BatchSequence, ContractViolation, GridSequence, GroupedSequence, ImageProtocol, Painter,
    RenderError, SequenceError, Sequencer, TerminalPainter,
};

// --- Runtime re-exports ----------------------------------------------------

pub use lscat_runtime::{
    Batch, BatchError, DispatchReport, Fetch, Job, ReplayReport, StoredBatch, Tracker,
    TrackerError, TrackerState, UpdateOutcome, dispatch, show_instant,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type.
#[derive(Debug)]
pub enum Error {
    /// The batch directory could not be read.
    Io(io::Error),
    /// The batch could not be assembled.
    Batch(BatchError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Batch(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Batch(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<BatchError> for Error {
    fn from(err: BatchError) -> Self {
        Self::Batch(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Display every item stored in `dir` through `painter`.
///
/// The batch spans up to the highest stored position, so a gap in the
/// directory stalls the display there; the report names the missing
/// position. In grouped mode the header count is `known_headers`, else the
/// one stored in the directory's sidecar, else one header per `group_size`
/// items.
pub fn show_dir<P: Painter>(
    config: Config,
    dir: &Path,
    known_headers: Option<usize>,
    painter: P,
) -> Result<ReplayReport> {
    replay_dir(config, dir, known_headers, None, painter)
}

/// Redisplay only the positions in `window` of a grid batch stored in `dir`,
/// each in its own cell. Used when scrolling back to a partly shown page.
pub fn show_scroll<P: Painter>(
    config: Config,
    dir: &Path,
    window: Range<usize>,
    painter: P,
) -> Result<ReplayReport> {
    replay_dir(config, dir, None, Some(window), painter)
}

fn replay_dir<P: Painter>(
    config: Config,
    dir: &Path,
    known_headers: Option<usize>,
    window: Option<Range<usize>>,
    painter: P,
) -> Result<ReplayReport> {
    let stored = StoredBatch::scan(dir)?;
    let total = stored.span();
    let mut batch = Batch::new(config, dir, total);
    if batch.config().mode == DisplayMode::Grouped {
        let headers = lscat_runtime::resolve_header_count(
            known_headers,
            dir,
            total,
            batch.config().group_size,
        );
        batch = batch.with_header_count(headers);
    }
    if let Some(window) = window {
        batch = batch.with_window(window);
    }
    info!(dir = %dir.display(), total, "showing stored batch");
    let tracker = batch.tracker(painter)?;
    Ok(lscat_runtime::replay(stored, &tracker))
}

/// [`show_dir`] onto stdout, with configuration read from the environment.
pub fn show_dir_stdout(dir: &Path, known_headers: Option<usize>) -> Result<ReplayReport> {
    let config = Config::from_env();
    let painter = TerminalPainter::stdout(&config);
    show_dir(config, dir, known_headers, painter)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Batch, Config, Error, ItemId, Painter, Result, Sequencer, TerminalPainter, Tracker,
        UpdateOutcome, show_dir, show_scroll,
    };

    pub use crate::{core, layout, render, runtime};
}

pub use lscat_core as core;
pub use lscat_layout as layout;
pub use lscat_render as render;
pub use lscat_runtime as runtime;

#[cfg(test)]
mod tests {
    use super::*;
    use lscat_render::testing::RecordingPainter;
    use std::fs;

    #[test]
    fn show_dir_grid() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["001_b.png", "000_a.png", "002_c.png"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let painter = RecordingPainter::new();
        let config = Config::default().with_canvas(100, 20).with_annotate(false);

        let report = show_dir(config, dir.path(), None, painter.clone()).unwrap();

        assert_eq!(report.delivered, 3);
        assert_eq!(painter.rendered(), ["000_a.png", "001_b.png", "002_c.png"]);
    }

    #[test]
    fn show_dir_grouped_uses_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        for n in 0..6 {
            fs::write(dir.path().join(format!("{n:03}_u.jpg")), b"").unwrap();
        }
        lscat_runtime::write_header_count(dir.path(), 2).unwrap();
        let painter = RecordingPainter::new();
        let config = Config::default()
            .with_canvas(100, 20)
            .with_mode(DisplayMode::Grouped)
            .with_annotate(false);

        show_dir(config, dir.path(), None, painter.clone()).unwrap();

        assert_eq!(
            painter.rendered(),
            ["000_u.jpg", "002_u.jpg", "003_u.jpg", "004_u.jpg", "001_u.jpg", "005_u.jpg"]
        );
    }

    #[test]
    fn show_dir_reports_a_gap() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["000_a.png", "001_b.png", "005_f.png"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let painter = RecordingPainter::new();
        let config = Config::default().with_canvas(100, 20).with_annotate(false);

        let report = show_dir(config, dir.path(), None, painter.clone()).unwrap();

        assert_eq!(report.outside, 0);
        assert_eq!(report.waiting_for, Some(SequenceNumber::new(2)));
        assert_eq!(painter.rendered(), ["000_a.png", "001_b.png"]);
    }

    #[test]
    fn show_scroll_places_items_by_position() {
        let dir = tempfile::tempdir().unwrap();
        for n in 0..12 {
            fs::write(dir.path().join(format!("{n:03}_p.png")), b"").unwrap();
        }
        let painter = RecordingPainter::new();
        let config = Config::default().with_canvas(100, 20).with_annotate(false);

        let report = show_scroll(config, dir.path(), 7..12, painter.clone()).unwrap();

        assert_eq!(report.outside, 7);
        assert_eq!(painter.rendered().len(), 5);
        assert_eq!(painter.positions()[0], (38, 9));
        assert_eq!(painter.positions()[3], (2, 0));
    }

    #[test]
    fn missing_dir_is_io_error() {
        let err = show_dir(
            Config::default(),
            Path::new("/nonexistent/lscat"),
            None,
            RecordingPainter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
