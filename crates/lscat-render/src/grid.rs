#![forbid(unsafe_code)]

//! Uniform grid sequencer.
//!
//! Item `n` lands in column `n % columns` and row `(n / columns) % rows`.
//! Every `columns * rows` items the grid wraps onto a new page.
//!
//! A sequence may cover a window of the batch (`10..30` when scrolling back
//! to a page that was partly shown): items still land by their own position.

use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

use lscat_core::{Config, ItemId, SequenceNumber};
use lscat_layout::LayoutTable;

use crate::error::{ContractViolation, SequenceError};
use crate::painter::Painter;
use crate::sequence::{Lifecycle, Sequencer};

/// Renders a run of positions in ascending order onto a grid.
#[derive(Debug)]
pub struct GridSequence<P> {
    layout: Arc<LayoutTable>,
    dir: PathBuf,
    painter: P,
    life: Lifecycle,
    page_spacing: u16,
    annotate: bool,
}

impl<P> GridSequence<P> {
    /// Sequencer for `total` items stored under `dir`.
    pub fn new(
        layout: Arc<LayoutTable>,
        config: &Config,
        dir: impl Into<PathBuf>,
        total: usize,
        painter: P,
    ) -> Self {
        Self::window(layout, config, dir, 0..total, painter)
    }

    /// Sequencer for the positions in `window` only.
    pub fn window(
        layout: Arc<LayoutTable>,
        config: &Config,
        dir: impl Into<PathBuf>,
        window: Range<usize>,
        painter: P,
    ) -> Self {
        Self {
            layout,
            dir: dir.into(),
            painter,
            life: Lifecycle::window(window.start, window.end),
            page_spacing: config.page_spacing,
            annotate: config.annotate,
        }
    }

    pub fn painter(&self) -> &P {
        &self.painter
    }

    pub fn into_painter(self) -> P {
        self.painter
    }
}

impl<P: Painter> GridSequence<P> {
    /// Column numbers under the last row, so a reader can address items.
    fn annotate_columns(&mut self) -> Result<(), SequenceError> {
        let y = self.layout.bottom();
        for (index, &x) in self.layout.columns().iter().enumerate() {
            self.painter.annotate(x, y, &(index + 1).to_string())?;
        }
        Ok(())
    }
}

impl<P: Painter> Sequencer for GridSequence<P> {
    fn prime(&mut self) -> Result<(), SequenceError> {
        self.life.prime()?;
        self.painter.clear()?;
        Ok(())
    }

    fn resume(&mut self, item: &ItemId) -> Result<(), SequenceError> {
        let seq = item.seq();
        self.life.admit(seq)?;
        let expected = SequenceNumber::new(self.life.next_position());
        if seq != expected {
            return Err(ContractViolation::OutOfOrder { expected, got: seq }.into());
        }
        self.life.consume();

        let cell = self.layout.grid_cell(seq.get());
        let footprint = self.layout.footprint();
        if cell.starts_page {
            self.painter.page_break(self.page_spacing)?;
        }
        self.painter.render(
            &self.dir.join(item.as_str()),
            cell.x,
            cell.y,
            footprint.width,
            footprint.height,
        )?;

        if self.annotate && self.is_exhausted() {
            self.annotate_columns()?;
        }
        Ok(())
    }

    fn expected_total(&self) -> usize {
        self.life.total()
    }

    fn consumed(&self) -> usize {
        self.life.consumed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PaintCall, RecordingPainter};
    use lscat_core::CanvasSize;
    use proptest::prelude::*;

    fn config() -> Config {
        Config::default()
            .with_canvas(100, 20)
            .with_annotate(false)
    }

    fn sequence(config: &Config, total: usize) -> (GridSequence<RecordingPainter>, RecordingPainter) {
        let layout = Arc::new(LayoutTable::from_config(CanvasSize::new(100, 20), config));
        let painter = RecordingPainter::new();
        let seq = GridSequence::new(layout, config, "/batch", total, painter.clone());
        (seq, painter)
    }

    fn item(n: usize) -> ItemId {
        ItemId::compose(SequenceNumber::new(n), "test", "png")
    }

    #[test]
    fn thirty_items_fill_three_pages() {
        let (mut seq, painter) = sequence(&config(), 30);
        seq.prime().unwrap();
        for n in 0..30 {
            seq.resume(&item(n)).unwrap();
        }

        let (xs, ys): (Vec<u16>, Vec<u16>) = painter.positions().into_iter().unzip();
        assert_eq!(xs, [2, 20, 38, 56, 74].repeat(6));
        assert_eq!(ys, [0, 0, 0, 0, 0, 9, 9, 9, 9, 9].repeat(3));

        let calls = painter.calls();
        assert_eq!(calls[0], PaintCall::Clear);
        let breaks = calls
            .iter()
            .filter(|c| matches!(c, PaintCall::PageBreak(20)))
            .count();
        assert_eq!(breaks, 2);
        assert!(seq.is_exhausted());
    }

    #[test]
    fn render_paths_join_batch_dir() {
        let (mut seq, painter) = sequence(&config(), 1);
        seq.prime().unwrap();
        seq.resume(&item(0)).unwrap();
        assert_eq!(
            painter.calls()[1],
            PaintCall::Render {
                path: PathBuf::from("/batch/000_test.png"),
                x: 2,
                y: 0,
                width: 18,
                height: 8,
            }
        );
    }

    #[test]
    fn column_numbers_follow_last_item_when_annotating() {
        let config = config().with_annotate(true);
        let (mut seq, painter) = sequence(&config, 3);
        seq.prime().unwrap();
        for n in 0..3 {
            seq.resume(&item(n)).unwrap();
        }
        let notes: Vec<(u16, u16, String)> = painter
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                PaintCall::Annotate { x, y, text } => Some((x, y, text)),
                _ => None,
            })
            .collect();
        assert_eq!(notes.len(), 5);
        assert_eq!(notes[0], (2, 17, "1".to_string()));
        assert_eq!(notes[4], (74, 17, "5".to_string()));
    }

    #[test]
    fn resume_before_prime_is_a_violation() {
        let (mut seq, painter) = sequence(&config(), 3);
        let err = seq.resume(&item(0)).unwrap_err();
        assert!(matches!(err, SequenceError::Contract(ContractViolation::NotPrimed)));
        assert!(painter.calls().is_empty());
    }

    #[test]
    fn priming_twice_is_a_violation() {
        let (mut seq, _) = sequence(&config(), 3);
        seq.prime().unwrap();
        assert!(matches!(
            seq.prime(),
            Err(SequenceError::Contract(ContractViolation::AlreadyPrimed))
        ));
    }

    #[test]
    fn out_of_order_item_is_a_violation() {
        let (mut seq, _) = sequence(&config(), 3);
        seq.prime().unwrap();
        let err = seq.resume(&item(1)).unwrap_err();
        assert!(matches!(
            err,
            SequenceError::Contract(ContractViolation::OutOfOrder { .. })
        ));
    }

    #[test]
    fn out_of_range_item_is_a_violation() {
        let (mut seq, _) = sequence(&config(), 3);
        seq.prime().unwrap();
        assert!(matches!(
            seq.resume(&item(7)),
            Err(SequenceError::Contract(ContractViolation::OutOfRange { total: 3, .. }))
        ));
    }

    #[test]
    fn resuming_past_total_is_a_violation() {
        let (mut seq, _) = sequence(&config(), 1);
        seq.prime().unwrap();
        seq.resume(&item(0)).unwrap();
        assert!(matches!(
            seq.resume(&item(0)),
            Err(SequenceError::Contract(ContractViolation::Exhausted { total: 1 }))
        ));
    }

    #[test]
    fn failed_render_still_consumes_the_item() {
        let config = config();
        let layout = Arc::new(LayoutTable::from_config(CanvasSize::new(100, 20), &config));
        let painter = RecordingPainter::new().failing_on("000_test.png");
        let mut seq = GridSequence::new(layout, &config, "/batch", 2, painter.clone());
        seq.prime().unwrap();
        assert!(matches!(seq.resume(&item(0)), Err(SequenceError::Render(_))));
        seq.resume(&item(1)).unwrap();
        assert_eq!(painter.positions(), vec![(2, 0), (20, 0)]);
    }

    #[test]
    fn window_places_items_by_their_own_position() {
        let config = config();
        let layout = Arc::new(LayoutTable::from_config(CanvasSize::new(100, 20), &config));
        let painter = RecordingPainter::new();
        let mut seq = GridSequence::window(layout, &config, "/batch", 8..13, painter.clone());
        seq.prime().unwrap();
        for n in 8..13 {
            seq.resume(&item(n)).unwrap();
        }

        assert_eq!(
            painter.positions(),
            vec![(56, 9), (74, 9), (2, 0), (20, 0), (38, 0)]
        );
        let calls = painter.calls();
        assert_eq!(calls[0], PaintCall::Clear);
        assert_eq!(calls[3], PaintCall::PageBreak(20));
        assert!(seq.is_exhausted());
        assert_eq!(seq.consumed(), 5);
    }

    #[test]
    fn window_rejects_positions_before_its_start() {
        let config = config();
        let layout = Arc::new(LayoutTable::from_config(CanvasSize::new(100, 20), &config));
        let mut seq = GridSequence::window(layout, &config, "/batch", 10..30, RecordingPainter::new());
        seq.prime().unwrap();
        assert!(matches!(
            seq.resume(&item(0)),
            Err(SequenceError::Contract(ContractViolation::OutOfRange { total: 30, .. }))
        ));
        assert!(matches!(
            seq.resume(&item(11)),
            Err(SequenceError::Contract(ContractViolation::OutOfOrder { .. }))
        ));
        seq.resume(&item(10)).unwrap();
    }

    proptest! {
        #[test]
        fn placement_matches_modular_arithmetic(width in 20u16..=240, height in 9u16..=80, total in 0usize..=120) {
            let config = Config::default().with_annotate(false);
            let layout = Arc::new(LayoutTable::from_config(CanvasSize::new(width, height), &config));
            let painter = RecordingPainter::new();
            let mut seq = GridSequence::new(layout.clone(), &config, "/b", total, painter.clone());
            seq.prime().unwrap();
            for n in 0..total {
                seq.resume(&item(n)).unwrap();
            }
            let cols = layout.column_count();
            let rows = layout.row_count();
            let expected: Vec<(u16, u16)> = (0..total)
                .map(|n| (layout.columns()[n % cols], layout.rows()[(n / cols) % rows]))
                .collect();
            prop_assert_eq!(painter.positions(), expected);
        }
    }
}
