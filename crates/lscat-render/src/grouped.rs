#![forbid(unsafe_code)]

//! Grouped sequencer: one header followed by its children, one group per row.
//!
//! Headers are recognised by their own sequence number (below the batch's
//! header count), not by their position in the stream. Each header opens a
//! group on the next row and resets the child cursor; children fill the
//! reserved child columns left to right.
//!
//! Children left over after the last header has a full group continue on
//! rows of their own, in the child columns only.

use std::path::PathBuf;
use std::sync::Arc;

use lscat_core::{Config, ItemId, ItemKind, SequenceNumber};
use lscat_layout::{GroupedColumns, LayoutTable};

use crate::error::{ContractViolation, SequenceError};
use crate::painter::Painter;
use crate::sequence::{Lifecycle, Sequencer};

/// Cursor of a grouped sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct GroupCursor {
    /// Rows opened so far; the current group's row is `rows - 1`.
    rows: usize,
    /// Headers seen so far.
    headers: usize,
    /// Children placed in the current group, `None` before the first header.
    child_index: Option<usize>,
    /// Children seen across all groups.
    children: usize,
}

/// Renders a grouped batch in canonical interleaved order.
#[derive(Debug)]
pub struct GroupedSequence<P> {
    layout: Arc<LayoutTable>,
    columns: GroupedColumns,
    dir: PathBuf,
    painter: P,
    life: Lifecycle,
    cursor: GroupCursor,
    header_count: usize,
    children_per_group: usize,
    page_spacing: u16,
    annotate: bool,
    label_x: u16,
}

impl<P> GroupedSequence<P> {
    /// Sequencer for `total` items under `dir`, the first `header_count`
    /// of which are headers.
    ///
    /// A `group_size` of zero is treated as one (headers only).
    pub fn new(
        layout: Arc<LayoutTable>,
        config: &Config,
        dir: impl Into<PathBuf>,
        total: usize,
        header_count: usize,
        painter: P,
    ) -> Self {
        let children_per_group = config.group_size.saturating_sub(1);
        let columns = GroupedColumns::new(&layout, children_per_group, config.child_x_offset);
        Self {
            layout,
            columns,
            dir: dir.into(),
            painter,
            life: Lifecycle::new(total),
            cursor: GroupCursor::default(),
            header_count,
            children_per_group,
            page_spacing: config.page_spacing,
            annotate: config.annotate,
            label_x: config.label_x,
        }
    }

    pub fn painter(&self) -> &P {
        &self.painter
    }

    pub fn into_painter(self) -> P {
        self.painter
    }

    #[inline]
    pub fn header_count(&self) -> usize {
        self.header_count
    }

    /// Validate a header and advance the cursor; returns its row.
    fn accept_header(&mut self, seq: SequenceNumber) -> Result<usize, ContractViolation> {
        if let Some(placed) = self.cursor.child_index
            && placed < self.children_per_group
            && self.children_remaining()
        {
            return Err(ContractViolation::UnexpectedHeader {
                seq,
                missing_children: self.children_per_group - placed,
            });
        }
        let expected = SequenceNumber::new(self.cursor.headers);
        if seq != expected {
            return Err(ContractViolation::OutOfOrder { expected, got: seq });
        }
        self.cursor.headers += 1;
        Ok(self.open_row())
    }

    /// Validate a child and advance the cursor; returns `(slot, row, opened)`
    /// where `opened` is set when the child starts an overflow row.
    fn accept_child(
        &mut self,
        seq: SequenceNumber,
    ) -> Result<(usize, usize, bool), ContractViolation> {
        // `None` opens an overflow row once every header has been placed.
        let slot = match self.cursor.child_index {
            Some(placed) if placed < self.children_per_group => Some(placed),
            _ if self.cursor.headers == self.header_count => None,
            _ => return Err(ContractViolation::UnexpectedChild { seq }),
        };
        let expected = SequenceNumber::new(self.header_count + self.cursor.children);
        if seq != expected {
            return Err(ContractViolation::OutOfOrder { expected, got: seq });
        }
        self.cursor.children += 1;
        match slot {
            Some(slot) => {
                self.cursor.child_index = Some(slot + 1);
                Ok((slot, self.cursor.rows - 1, false))
            }
            None => {
                let row = self.open_row();
                self.cursor.child_index = Some(1);
                Ok((0, row, true))
            }
        }
    }

    /// Whether any child has yet to be placed.
    fn children_remaining(&self) -> bool {
        self.header_count + self.cursor.children < self.life.total()
    }

    fn open_row(&mut self) -> usize {
        let row = self.cursor.rows;
        self.cursor.rows += 1;
        self.cursor.child_index = Some(0);
        row
    }
}

impl<P: Painter> GroupedSequence<P> {
    fn break_page_before(&mut self, row: usize) -> Result<(), SequenceError> {
        if row != 0 && row % self.layout.row_count() == 0 {
            self.painter.page_break(self.page_spacing)?;
        }
        Ok(())
    }
}

impl<P: Painter> Sequencer for GroupedSequence<P> {
    fn prime(&mut self) -> Result<(), SequenceError> {
        self.life.prime()?;
        self.painter.clear()?;
        Ok(())
    }

    fn resume(&mut self, item: &ItemId) -> Result<(), SequenceError> {
        let seq = item.seq();
        self.life.admit(seq)?;
        let footprint = self.layout.footprint();
        let path = self.dir.join(item.as_str());

        match item.kind(self.header_count) {
            ItemKind::Header => {
                let row = self.accept_header(seq)?;
                self.life.consume();

                let y = self.layout.row_y(row);
                self.break_page_before(row)?;
                if self.annotate {
                    let label = format!("{:02}\n{}", seq.get(), item.label());
                    self.painter.annotate(self.label_x, y, &label)?;
                }
                self.painter.render(
                    &path,
                    self.columns.header_x(),
                    y,
                    footprint.width,
                    footprint.height,
                )?;
            }
            ItemKind::Child => {
                let (slot, row, opened) = self.accept_child(seq)?;
                self.life.consume();

                if opened {
                    self.break_page_before(row)?;
                }
                self.painter.render(
                    &path,
                    self.columns.child_x(slot),
                    self.layout.row_y(row),
                    footprint.width,
                    footprint.height,
                )?;
            }
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
    use lscat_layout::canonical_order;
    use proptest::prelude::*;

    fn config(group_size: usize) -> Config {
        let mut config = Config::default().with_canvas(100, 20).with_annotate(false);
        config.group_size = group_size;
        config
    }

    fn sequence(
        config: &Config,
        total: usize,
        headers: usize,
    ) -> (GroupedSequence<RecordingPainter>, RecordingPainter) {
        let layout = Arc::new(LayoutTable::from_config(CanvasSize::new(100, 20), config));
        let painter = RecordingPainter::new();
        let seq = GroupedSequence::new(layout, config, "/users", total, headers, painter.clone());
        (seq, painter)
    }

    fn item(n: usize) -> ItemId {
        ItemId::compose(SequenceNumber::new(n), "user", "jpg")
    }

    fn feed(seq: &mut GroupedSequence<RecordingPainter>, order: &[usize]) {
        seq.prime().unwrap();
        for &n in order {
            seq.resume(&item(n)).unwrap();
        }
    }

    fn page_breaks(painter: &RecordingPainter) -> usize {
        painter
            .calls()
            .iter()
            .filter(|c| matches!(c, PaintCall::PageBreak(_)))
            .count()
    }

    #[test]
    fn thirty_groups_of_four() {
        let config = config(4);
        let (mut seq, painter) = sequence(&config, 120, 30);
        feed(&mut seq, &canonical_order(120, 30, 4).unwrap());

        let (xs, ys): (Vec<u16>, Vec<u16>) = painter.positions().into_iter().unzip();
        assert_eq!(xs, [2, 39, 57, 75].repeat(30));
        let expected_ys: Vec<u16> = (0..30)
            .flat_map(|group| [if group % 2 == 0 { 0 } else { 9 }; 4])
            .collect();
        assert_eq!(ys, expected_ys);
        assert_eq!(page_breaks(&painter), 14);
        assert!(seq.is_exhausted());
    }

    #[test]
    fn header_label_sits_beside_header() {
        let config = config(4).with_annotate(true);
        let layout = Arc::new(LayoutTable::from_config(CanvasSize::new(100, 20), &config));
        let painter = RecordingPainter::new();
        let mut seq = GroupedSequence::new(layout, &config, "/users", 8, 2, painter.clone());
        seq.prime().unwrap();
        seq.resume(&ItemId::compose(SequenceNumber::new(0), "alice", "jpg"))
            .unwrap();
        for n in 2..5 {
            seq.resume(&item(n)).unwrap();
        }
        seq.resume(&ItemId::compose(SequenceNumber::new(1), "bob", "jpg"))
            .unwrap();

        let notes: Vec<PaintCall> = painter
            .calls()
            .into_iter()
            .filter(|c| matches!(c, PaintCall::Annotate { .. }))
            .collect();
        assert_eq!(
            notes,
            vec![
                PaintCall::Annotate {
                    x: 18,
                    y: 0,
                    text: "00\nalice".to_string()
                },
                PaintCall::Annotate {
                    x: 18,
                    y: 9,
                    text: "01\nbob".to_string()
                },
            ]
        );
    }

    #[test]
    fn header_before_group_is_full_is_a_violation() {
        let (mut seq, _) = sequence(&config(4), 120, 30);
        feed(&mut seq, &[0, 30]);
        assert!(matches!(
            seq.resume(&item(1)),
            Err(SequenceError::Contract(ContractViolation::UnexpectedHeader {
                missing_children: 2,
                ..
            }))
        ));
    }

    #[test]
    fn child_before_any_header_is_a_violation() {
        let (mut seq, painter) = sequence(&config(4), 120, 30);
        seq.prime().unwrap();
        assert!(matches!(
            seq.resume(&item(30)),
            Err(SequenceError::Contract(ContractViolation::UnexpectedChild { .. }))
        ));
        assert!(painter.positions().is_empty());
    }

    #[test]
    fn child_beyond_group_is_a_violation() {
        let (mut seq, _) = sequence(&config(4), 120, 30);
        feed(&mut seq, &[0, 30, 31, 32]);
        assert!(matches!(
            seq.resume(&item(33)),
            Err(SequenceError::Contract(ContractViolation::UnexpectedChild { .. }))
        ));
    }

    #[test]
    fn skipped_header_is_out_of_order() {
        let (mut seq, _) = sequence(&config(4), 120, 30);
        feed(&mut seq, &[0, 30, 31, 32]);
        assert!(matches!(
            seq.resume(&item(2)),
            Err(SequenceError::Contract(ContractViolation::OutOfOrder { .. }))
        ));
    }

    #[test]
    fn headers_without_children_once_children_run_out() {
        let (mut seq, painter) = sequence(&config(3), 4, 3);
        feed(&mut seq, &canonical_order(4, 3, 3).unwrap());
        assert_eq!(
            painter.rendered(),
            vec!["000_user.jpg", "003_user.jpg", "001_user.jpg", "002_user.jpg"]
        );
        assert!(seq.is_exhausted());
    }

    #[test]
    fn leftover_children_take_rows_of_their_own() {
        let (mut seq, painter) = sequence(&config(2), 7, 2);
        feed(&mut seq, &canonical_order(7, 2, 2).unwrap());
        assert_eq!(
            painter.positions(),
            vec![(2, 0), (75, 0), (2, 9), (75, 9), (75, 0), (75, 9), (75, 0)]
        );
        assert_eq!(page_breaks(&painter), 2);
    }

    proptest! {
        #[test]
        fn canonical_order_is_always_accepted(
            headers in 0usize..=20,
            extra in 0usize..=60,
            group_size in 1usize..=6,
        ) {
            let total = headers + extra;
            let config = config(group_size);
            let (mut seq, painter) = sequence(&config, total, headers);
            seq.prime().unwrap();
            for n in canonical_order(total, headers, group_size).unwrap() {
                prop_assert!(seq.resume(&item(n)).is_ok());
            }
            prop_assert!(seq.is_exhausted());
            prop_assert_eq!(painter.positions().len(), total);
        }
    }
}
