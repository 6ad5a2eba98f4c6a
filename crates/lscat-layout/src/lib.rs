#![forbid(unsafe_code)]

//! Layout primitives and the canonical emission order.
//!
//! This crate is pure: nothing in it performs I/O or holds mutable state.
//!
//! - [`column_offsets`] / [`row_offsets`] - canvas coordinates of the item grid
//! - [`LayoutTable`] - the per-batch coordinate tables, shared read-only
//! - [`GroupedColumns`] - header and child columns for grouped layouts
//! - [`canonical_order`] - the order in which items must be emitted
//!
//! # Degenerate geometry
//!
//! A canvas narrower (or shorter) than one item still yields one column (or
//! row). Callers can therefore index `offsets[n % offsets.len()]` without
//! guarding against an empty table.
//!
//! ```
//! use lscat_layout::{column_offsets, row_offsets};
//!
//! assert_eq!(column_offsets(100, 18, 2, 0), vec![2, 20, 38, 56, 74]);
//! assert_eq!(row_offsets(20, 8, 1), vec![0, 9]);
//! assert_eq!(column_offsets(5, 18, 2, 0), vec![2]);
//! ```

pub mod order;

pub use lscat_core::CanvasSize;
pub use order::{OrderError, canonical_order, identity_order};

use lscat_core::Config;

/// Number of columns that fit across `canvas_width`.
///
/// Rounds half to even, so a canvas 2.5 items wide holds two columns. Never
/// returns zero.
pub fn column_count(canvas_width: u16, item_width: u16, padding: u16) -> usize {
    let stride = u32::from(item_width) + u32::from(padding);
    if stride == 0 {
        return 1;
    }
    let ratio = f64::from(canvas_width) / f64::from(stride);
    (ratio.round_ties_even() as usize).max(1)
}

/// Number of rows that fit down `canvas_height`. Never returns zero.
pub fn row_count(canvas_height: u16, item_height: u16, padding: u16) -> usize {
    let stride = usize::from(item_height) + usize::from(padding);
    if stride == 0 {
        return 1;
    }
    (usize::from(canvas_height) / stride).max(1)
}

/// X coordinate of every column, left to right.
///
/// Column `c` sits at `c * item_width + padding + x_offset`.
pub fn column_offsets(canvas_width: u16, item_width: u16, padding: u16, x_offset: u16) -> Vec<u16> {
    let count = column_count(canvas_width, item_width, padding);
    (0..count)
        .map(|col| {
            saturate(col % count)
                .saturating_mul(item_width)
                .saturating_add(padding)
                .saturating_add(x_offset)
        })
        .collect()
}

/// Y coordinate of every row, top to bottom.
///
/// Row `r` sits at `r * (item_height + padding)`.
pub fn row_offsets(canvas_height: u16, item_height: u16, padding: u16) -> Vec<u16> {
    let count = row_count(canvas_height, item_height, padding);
    let stride = item_height.saturating_add(padding);
    (0..count)
        .map(|row| saturate(row).saturating_mul(stride))
        .collect()
}

#[inline]
fn saturate(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Per-item footprint on the canvas, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Footprint {
    pub width: u16,
    pub height: u16,
    pub x_padding: u16,
    pub y_padding: u16,
}

impl Footprint {
    pub fn from_config(config: &Config) -> Self {
        Self {
            width: config.item_width,
            height: config.item_height,
            x_padding: config.x_padding,
            y_padding: config.y_padding,
        }
    }
}

/// Where one grid item lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub x: u16,
    pub y: u16,
    pub column: usize,
    pub row: usize,
    /// First item of a page other than the first.
    pub starts_page: bool,
}

/// Column and row coordinates for one batch.
///
/// Computed once from the canvas geometry and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTable {
    canvas: CanvasSize,
    footprint: Footprint,
    columns: Vec<u16>,
    rows: Vec<u16>,
}

impl LayoutTable {
    pub fn new(canvas: CanvasSize, footprint: Footprint) -> Self {
        Self::with_x_offset(canvas, footprint, 0)
    }

    pub fn with_x_offset(canvas: CanvasSize, footprint: Footprint, x_offset: u16) -> Self {
        Self {
            canvas,
            footprint,
            columns: column_offsets(canvas.width, footprint.width, footprint.x_padding, x_offset),
            rows: row_offsets(canvas.height, footprint.height, footprint.y_padding),
        }
    }

    pub fn from_config(canvas: CanvasSize, config: &Config) -> Self {
        Self::new(canvas, Footprint::from_config(config))
    }

    #[inline]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    #[inline]
    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    #[inline]
    pub fn columns(&self) -> &[u16] {
        &self.columns
    }

    #[inline]
    pub fn rows(&self) -> &[u16] {
        &self.rows
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Items shown on one page before the grid wraps.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.column_count() * self.row_count()
    }

    /// Y coordinate of row `row`, wrapping onto the next page.
    #[inline]
    pub fn row_y(&self, row: usize) -> u16 {
        self.rows[row % self.rows.len()]
    }

    /// Place the `index`-th item of a grid.
    pub fn grid_cell(&self, index: usize) -> GridCell {
        let cols = self.column_count();
        let column = index % cols;
        let row = (index / cols) % self.row_count();
        GridCell {
            x: self.columns[column],
            y: self.rows[row],
            column,
            row,
            starts_page: index != 0 && index % self.page_size() == 0,
        }
    }

    /// Y coordinate just below the last row of a page.
    pub fn bottom(&self) -> u16 {
        self.rows
            .last()
            .copied()
            .unwrap_or(0)
            .saturating_add(self.footprint.height)
    }
}

/// Columns used by the grouped layout.
///
/// The header of every group sits in the first column; children take the
/// last `child_slots` columns of a table shifted right by `child_x_offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedColumns {
    header_x: u16,
    child_xs: Vec<u16>,
}

impl GroupedColumns {
    pub fn new(table: &LayoutTable, child_slots: usize, child_x_offset: u16) -> Self {
        let footprint = table.footprint();
        let header_x = table.columns()[0];
        let shifted = column_offsets(
            table.canvas().width,
            footprint.width,
            footprint.x_padding,
            child_x_offset,
        );
        let keep = child_slots.min(shifted.len());
        let child_xs = shifted[shifted.len() - keep..].to_vec();
        Self { header_x, child_xs }
    }

    #[inline]
    pub fn header_x(&self) -> u16 {
        self.header_x
    }

    #[inline]
    pub fn child_xs(&self) -> &[u16] {
        &self.child_xs
    }

    /// X coordinate of the `index`-th child of a group.
    ///
    /// When the canvas has fewer columns than child slots, children share the
    /// available columns round-robin.
    pub fn child_x(&self, index: usize) -> u16 {
        if self.child_xs.is_empty() {
            return self.header_x;
        }
        self.child_xs[index % self.child_xs.len()]
    }
}
