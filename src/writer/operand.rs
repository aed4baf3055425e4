//! Opaque operand handles handed out by a kernel writer.
//!
//! Operands never own or borrow the tile they name. The writer resolves them
//! on every call, which is how stale handles (tiles dropped by a closed scope)
//! and handles from another writer are caught.

use crate::error::{KernelWriterError, Result};
use crate::tile::TileArea;
use crate::types::TensorComponentType;

/// What a tile operand points at inside its writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TileSource {
    /// Arena slot plus the serial of the entry that was declared there.
    Variable { slot: usize, serial: u64 },
    /// Index into the writer's constant tiles.
    Constant(usize),
    /// A tensor component promoted to a scalar tile.
    Component {
        tensor: usize,
        component: TensorComponentType,
    },
}

/// Handle to a tile, or a rectangular sub-range of one.
///
/// Sub-views are relative to the current view: `op.row(1)` is the second row
/// of `op`, not of the underlying tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileOperand {
    pub(crate) writer: u32,
    pub(crate) source: TileSource,
    full: TileArea,
    area: TileArea,
}

impl TileOperand {
    pub(crate) fn new(writer: u32, source: TileSource, height: i32, width: i32) -> Result<Self> {
        let full = TileArea::new(0, height, 0, width)?;
        Ok(TileOperand {
            writer,
            source,
            full,
            area: full,
        })
    }

    /// Absolute area inside the underlying tile.
    pub fn area(&self) -> TileArea {
        self.area
    }

    pub fn height(&self) -> i32 {
        self.area.height()
    }

    pub fn width(&self) -> i32 {
        self.area.width()
    }

    pub fn is_scalar(&self) -> bool {
        self.height() == 1 && self.width() == 1
    }

    /// The whole underlying tile, whatever sub-range this handle covers.
    pub fn tile(&self) -> TileOperand {
        TileOperand {
            area: self.full,
            ..*self
        }
    }

    pub fn row(&self, row: i32) -> Result<TileOperand> {
        self.row_range(row, row + 1)
    }

    pub fn scalar(&self, row: i32, col: i32) -> Result<TileOperand> {
        self.row(row)?.col_range(col, col + 1)
    }

    pub fn row_range(&self, start: i32, end: i32) -> Result<TileOperand> {
        self.sub_area(start, end, 0, self.width())
    }

    pub fn col_range(&self, start: i32, end: i32) -> Result<TileOperand> {
        self.sub_area(0, self.height(), start, end)
    }

    fn sub_area(&self, row_start: i32, row_end: i32, col_start: i32, col_end: i32) -> Result<TileOperand> {
        let out_of_view = row_start < 0
            || col_start < 0
            || row_end > self.height()
            || col_end > self.width();
        if out_of_view {
            return Err(KernelWriterError::InvalidTileArea {
                row_start,
                row_end,
                col_start,
                col_end,
            });
        }
        let area = TileArea::new(
            self.area.row_start() + row_start,
            self.area.row_start() + row_end,
            self.area.col_start() + col_start,
            self.area.col_start() + col_end,
        )?;
        Ok(TileOperand { area, ..*self })
    }
}

/// Handle to a tensor argument declared on a writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TensorOperand {
    pub(crate) writer: u32,
    pub(crate) index: usize,
}
