use super::{ScalarTile, TileVariable, VectorTile};
use crate::error::{KernelWriterError, Result};
use crate::types::DataType;

/// Half-open row and column ranges inside a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileArea {
    row_start: i32,
    row_end: i32,
    col_start: i32,
    col_end: i32,
}

impl TileArea {
    pub fn new(row_start: i32, row_end: i32, col_start: i32, col_end: i32) -> Result<Self> {
        if row_start < 0 || col_start < 0 || row_start >= row_end || col_start >= col_end {
            return Err(KernelWriterError::InvalidTileArea {
                row_start,
                row_end,
                col_start,
                col_end,
            });
        }
        Ok(TileArea {
            row_start,
            row_end,
            col_start,
            col_end,
        })
    }

    pub fn row_start(&self) -> i32 {
        self.row_start
    }

    pub fn row_end(&self) -> i32 {
        self.row_end
    }

    pub fn col_start(&self) -> i32 {
        self.col_start
    }

    pub fn col_end(&self) -> i32 {
        self.col_end
    }

    pub fn height(&self) -> i32 {
        self.row_end - self.row_start
    }

    pub fn width(&self) -> i32 {
        self.col_end - self.col_start
    }
}

/// Borrowed rectangular window over a tile.
///
/// Indices passed to `scalar`/`vector` are relative to the window and are
/// clamped to it, so a one-row view broadcasts over any row index.
pub struct TileView<'a, T: ?Sized> {
    tile: &'a T,
    area: TileArea,
}

impl<T: ?Sized> Clone for TileView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for TileView<'_, T> {}

impl<'a, T: VectorTile + ?Sized> TileView<'a, T> {
    /// View covering the whole tile.
    pub fn new(tile: &'a T) -> Self {
        let info = tile.info();
        TileView {
            tile,
            area: TileArea {
                row_start: 0,
                row_end: info.height,
                col_start: 0,
                col_end: info.width,
            },
        }
    }

    pub fn with_area(tile: &'a T, area: TileArea) -> Result<Self> {
        let info = tile.info();
        if area.row_end > info.height || area.col_end > info.width {
            return Err(KernelWriterError::InvalidTileArea {
                row_start: area.row_start,
                row_end: area.row_end,
                col_start: area.col_start,
                col_end: area.col_end,
            });
        }
        Ok(TileView { tile, area })
    }

    pub fn full_tile(&self) -> &'a T {
        self.tile
    }

    pub fn area(&self) -> TileArea {
        self.area
    }

    pub fn name(&self) -> &'a str {
        self.tile.name()
    }

    pub fn data_type(&self) -> DataType {
        self.tile.info().data_type
    }

    pub fn row_start(&self) -> i32 {
        self.area.row_start
    }

    pub fn row_end(&self) -> i32 {
        self.area.row_end
    }

    pub fn col_start(&self) -> i32 {
        self.area.col_start
    }

    pub fn col_end(&self) -> i32 {
        self.area.col_end
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

    pub fn is_full_tile(&self) -> bool {
        let info = self.tile.info();
        self.area.row_start == 0
            && self.area.row_end == info.height
            && self.area.col_start == 0
            && self.area.col_end == info.width
    }

    pub fn is_assignable(&self) -> bool {
        self.tile.is_assignable()
    }

    fn tile_row(&self, row: i32) -> i32 {
        self.area.row_start + row.clamp(0, self.height() - 1)
    }

    pub fn scalar(&self, row: i32, col: i32) -> TileVariable {
        let col = self.area.col_start + col.clamp(0, self.width() - 1);
        self.tile.scalar(self.tile_row(row), col)
    }

    pub fn vector(&self, row: i32) -> Result<TileVariable> {
        let row = self.tile_row(row);
        if self.area.col_start == 0 && self.area.col_end == self.tile.info().width {
            Ok(self.tile.vector(row))
        } else {
            self.tile
                .vector_range(row, self.area.col_start, self.area.width())
        }
    }

    /// `width` lanes of a view row starting at view column `col_start`.
    pub fn vector_range(&self, row: i32, col_start: i32, width: i32) -> Result<TileVariable> {
        if col_start < 0 || col_start + width > self.width() {
            return Err(KernelWriterError::InvalidTileArea {
                row_start: self.area.row_start,
                row_end: self.area.row_end,
                col_start: self.area.col_start + col_start,
                col_end: self.area.col_start + col_start + width,
            });
        }
        if col_start == 0 && width == self.tile.info().width {
            return Ok(self.tile.vector(self.tile_row(row)));
        }
        self.tile
            .vector_range(self.tile_row(row), self.area.col_start + col_start, width)
    }
}
