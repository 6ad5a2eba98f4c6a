#![forbid(unsafe_code)]

//! Batch assembly.
//!
//! A [`Batch`] turns a configuration snapshot and a batch directory into a
//! primed [`Tracker`]: it fixes the canvas size, computes the layout table
//! and the emission order, and builds the sequencer for the display mode.
//!
//! A grid batch can be narrowed to a window of positions with
//! [`Batch::with_window`], which redisplays part of a page without touching
//! the positions before it.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lscat_core::{CanvasSize, Config, DisplayMode, debug};
use lscat_layout::{LayoutTable, OrderError, canonical_order, identity_order};
use lscat_render::{BatchSequence, GridSequence, GroupedSequence, Painter};

use crate::error::BatchError;
use crate::tracker::Tracker;

/// Canvas to lay a batch out on: the configured size, else the terminal's,
/// else [`CanvasSize::FALLBACK`].
pub fn resolve_canvas(config: &Config) -> CanvasSize {
    if let Some(canvas) = config.canvas {
        return canvas;
    }
    match crossterm::terminal::size() {
        Ok((width, height)) if width > 0 && height > 0 => CanvasSize::new(width, height),
        _ => CanvasSize::FALLBACK,
    }
}

/// One set of items displayed together.
#[derive(Debug, Clone)]
pub struct Batch {
    config: Config,
    dir: PathBuf,
    total: usize,
    header_count: usize,
    window: Option<Range<usize>>,
    canvas: CanvasSize,
}

impl Batch {
    /// A batch of `total` items stored under `dir`.
    ///
    /// The canvas is resolved here, once; later terminal resizes do not
    /// affect the batch.
    pub fn new(config: Config, dir: impl Into<PathBuf>, total: usize) -> Self {
        let canvas = resolve_canvas(&config);
        Self {
            config,
            dir: dir.into(),
            total,
            header_count: 0,
            window: None,
            canvas,
        }
    }

    /// Number of header items in a grouped batch. Ignored in grid mode.
    #[must_use]
    pub fn with_header_count(mut self, header_count: usize) -> Self {
        self.header_count = header_count;
        self
    }

    /// Display only the positions in `window`, clamped to the batch.
    /// Ignored in grouped mode.
    #[must_use]
    pub fn with_window(mut self, window: Range<usize>) -> Self {
        self.window = Some(window);
        self
    }

    /// Positions a grid batch displays.
    pub fn grid_window(&self) -> Range<usize> {
        match &self.window {
            Some(window) => window.start.min(self.total)..window.end.min(self.total),
            None => 0..self.total,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn layout(&self) -> LayoutTable {
        LayoutTable::from_config(self.canvas, &self.config)
    }

    /// The order items must be displayed in.
    pub fn order(&self) -> Result<Vec<usize>, OrderError> {
        match self.config.mode {
            DisplayMode::Grid => match self.window {
                Some(_) => Ok(self.grid_window().collect()),
                None => Ok(identity_order(self.total)),
            },
            DisplayMode::Grouped => {
                canonical_order(self.total, self.header_count, self.config.group_size)
            }
        }
    }

    /// The unprimed sequencer for this batch's display mode.
    pub fn sequencer<P: Painter>(&self, painter: P) -> BatchSequence<P> {
        let layout = Arc::new(self.layout());
        match self.config.mode {
            DisplayMode::Grid => GridSequence::window(
                layout,
                &self.config,
                self.dir.clone(),
                self.grid_window(),
                painter,
            )
            .into(),
            DisplayMode::Grouped => GroupedSequence::new(
                layout,
                &self.config,
                self.dir.clone(),
                self.total,
                self.header_count,
                painter,
            )
            .into(),
        }
    }

    /// Build and prime the tracker that displays this batch through `painter`.
    pub fn tracker<P: Painter>(&self, painter: P) -> Result<Tracker<BatchSequence<P>>, BatchError> {
        let order = self.order()?;
        debug!(
            mode = ?self.config.mode,
            total = self.total,
            headers = self.header_count,
            window = ?self.window,
            width = self.canvas.width,
            height = self.canvas.height,
            "assembling batch"
        );
        Ok(Tracker::new(order, self.sequencer(painter))?)
    }
}
