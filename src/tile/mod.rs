//! Tiles: rectangular grids of scalar program variables or literals.
//!
//! A variable tile is declared once per row (`float4 G0__a__0;`) and is
//! referenced by name plus an optional swizzle. A constant tile is never
//! declared; every reference renders the literal values in place.
//! Indices outside the tile are clamped to the nearest edge, which makes a
//! one-row or one-lane tile broadcast for free.

mod view;

pub use view::{TileArea, TileView};

use crate::cl::helpers::{cl_data_type, lane_digit, validate_vector_width};
use crate::error::{KernelWriterError, Result};
use crate::types::{ConstantData, DataType};

/// Shape and element type of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileInfo {
    pub data_type: DataType,
    pub height: i32,
    pub width: i32,
}

impl TileInfo {
    pub fn new(data_type: DataType, height: i32, width: i32) -> Self {
        TileInfo {
            data_type,
            height,
            width,
        }
    }

    pub fn scalar(data_type: DataType) -> Self {
        Self::new(data_type, 1, 1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.height < 1 || self.width < 1 {
            return Err(KernelWriterError::InvalidTileShape {
                height: self.height,
                width: self.width,
            });
        }
        validate_vector_width(self.width)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileVariableDesc {
    pub data_type: DataType,
    /// Number of lanes the expression covers.
    pub len: i32,
}

/// Text of an expression referencing part of a tile, with its type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileVariable {
    pub str: String,
    pub desc: TileVariableDesc,
}

impl TileVariable {
    pub fn new(str: impl Into<String>, data_type: DataType, len: i32) -> Self {
        TileVariable {
            str: str.into(),
            desc: TileVariableDesc { data_type, len },
        }
    }
}

// ─── Capabilities ─────────────────────────────────────────────────

/// Element-level access to a tile.
pub trait ScalarTile {
    fn info(&self) -> &TileInfo;

    /// Base name; empty for constant tiles.
    fn name(&self) -> &str;

    fn scalar(&self, row: i32, col: i32) -> TileVariable;

    fn is_assignable(&self) -> bool;

    /// Every scalar, row-major.
    fn all(&self) -> Vec<TileVariable> {
        let info = self.info();
        let mut out = Vec::with_capacity((info.height * info.width) as usize);
        for row in 0..info.height {
            for col in 0..info.width {
                out.push(self.scalar(row, col));
            }
        }
        out
    }

    fn is_scalar(&self) -> bool {
        self.info().height == 1 && self.info().width == 1
    }
}

/// Row-level access to a tile.
pub trait VectorTile: ScalarTile {
    /// The whole row.
    fn vector(&self, row: i32) -> TileVariable;

    /// `width` lanes of a row starting at `col_start`.
    fn vector_range(&self, row: i32, col_start: i32, width: i32) -> Result<TileVariable>;
}

fn check_col_range(info: &TileInfo, col_start: i32, width: i32) -> Result<()> {
    validate_vector_width(width)?;
    if col_start < 0 || col_start + width > info.width {
        return Err(KernelWriterError::InvalidTileArea {
            row_start: 0,
            row_end: info.height,
            col_start,
            col_end: col_start + width,
        });
    }
    Ok(())
}

fn clamp_index(index: i32, len: i32) -> i32 {
    index.clamp(0, len - 1)
}

// ─── Variable tiles ───────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CLTile {
    name: String,
    info: TileInfo,
    row_names: Vec<String>,
}

impl CLTile {
    pub fn new(name: impl Into<String>, info: TileInfo) -> Result<Self> {
        info.validate()?;
        let name = name.into();
        let row_names = (0..info.height)
            .map(|row| {
                if info.height > 1 {
                    format!("{}__{}", name, row)
                } else {
                    name.clone()
                }
            })
            .collect();
        Ok(CLTile {
            name,
            info,
            row_names,
        })
    }

    /// Declaration statements, one per row.
    pub fn declarations(&self) -> String {
        let ty = cl_data_type(self.info.data_type, self.info.width);
        let mut out = String::new();
        for row in &self.row_names {
            out.push_str(&format!("{} {};\n", ty, row));
        }
        out
    }
}

impl ScalarTile for CLTile {
    fn info(&self) -> &TileInfo {
        &self.info
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn scalar(&self, row: i32, col: i32) -> TileVariable {
        let row = clamp_index(row, self.info.height);
        let col = clamp_index(col, self.info.width);
        let mut str = self.row_names[row as usize].clone();
        if self.info.width != 1 {
            str.push_str(".s");
            str.push(lane_digit(col));
        }
        TileVariable::new(str, self.info.data_type, 1)
    }

    fn is_assignable(&self) -> bool {
        true
    }
}

impl VectorTile for CLTile {
    fn vector(&self, row: i32) -> TileVariable {
        let row = clamp_index(row, self.info.height);
        TileVariable::new(
            self.row_names[row as usize].clone(),
            self.info.data_type,
            self.info.width,
        )
    }

    fn vector_range(&self, row: i32, col_start: i32, width: i32) -> Result<TileVariable> {
        check_col_range(&self.info, col_start, width)?;
        let row = clamp_index(row, self.info.height);
        let mut str = self.row_names[row as usize].clone();
        if self.info.width != 1 {
            str.push_str(".s");
            for lane in col_start..col_start + width {
                str.push(lane_digit(lane));
            }
        }
        Ok(TileVariable::new(str, self.info.data_type, width))
    }
}

// ─── Constant tiles ───────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct CLConstantTile {
    info: TileInfo,
    values: Vec<Vec<String>>,
}

impl CLConstantTile {
    pub fn new(data: &ConstantData) -> Result<Self> {
        let values = data.values().to_vec();
        let height = values.len() as i32;
        let width = values.first().map_or(0, |r| r.len() as i32);
        let info = TileInfo::new(data.data_type(), height, width);
        info.validate()?;
        Ok(CLConstantTile { info, values })
    }

    fn literal(&self, row: i32, col_start: i32, width: i32) -> String {
        let row = &self.values[clamp_index(row, self.info.height) as usize];
        let lanes: Vec<&str> = (col_start..col_start + width)
            .map(|col| row[clamp_index(col, self.info.width) as usize].as_str())
            .collect();
        format!(
            "(({})({}))",
            cl_data_type(self.info.data_type, width),
            lanes.join(", ")
        )
    }
}

impl ScalarTile for CLConstantTile {
    fn info(&self) -> &TileInfo {
        &self.info
    }

    fn name(&self) -> &str {
        ""
    }

    fn scalar(&self, row: i32, col: i32) -> TileVariable {
        let col = clamp_index(col, self.info.width);
        TileVariable::new(self.literal(row, col, 1), self.info.data_type, 1)
    }

    fn is_assignable(&self) -> bool {
        false
    }
}

impl VectorTile for CLConstantTile {
    fn vector(&self, row: i32) -> TileVariable {
        TileVariable::new(
            self.literal(row, 0, self.info.width),
            self.info.data_type,
            self.info.width,
        )
    }

    fn vector_range(&self, row: i32, col_start: i32, width: i32) -> Result<TileVariable> {
        check_col_range(&self.info, col_start, width)?;
        Ok(TileVariable::new(
            self.literal(row, col_start, width),
            self.info.data_type,
            width,
        ))
    }
}

// ─── Either kind ──────────────────────────────────────────────────

/// Owned tile of either kind, detached from the writer for memory operations.
#[derive(Clone, Debug, PartialEq)]
pub enum CLTileEntry {
    Variable(CLTile),
    Constant(CLConstantTile),
}

impl CLTileEntry {
    fn inner(&self) -> &dyn VectorTile {
        match self {
            CLTileEntry::Variable(t) => t as &dyn VectorTile,
            CLTileEntry::Constant(t) => t as &dyn VectorTile,
        }
    }
}

impl ScalarTile for CLTileEntry {
    fn info(&self) -> &TileInfo {
        self.inner().info()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn scalar(&self, row: i32, col: i32) -> TileVariable {
        self.inner().scalar(row, col)
    }

    fn is_assignable(&self) -> bool {
        self.inner().is_assignable()
    }
}

impl VectorTile for CLTileEntry {
    fn vector(&self, row: i32) -> TileVariable {
        self.inner().vector(row)
    }

    fn vector_range(&self, row: i32, col_start: i32, width: i32) -> Result<TileVariable> {
        self.inner().vector_range(row, col_start, width)
    }
}
