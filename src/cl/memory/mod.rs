//! Load/store code generation with boundary handling.
//!
//! A helper is created per memory operation and driven in three steps:
//! `initialize` with the x/z/batch coordinates (opens the X and Z guards),
//! `write_row` once per destination row (Y guard plus the access itself),
//! and `finalize` (closes Z then X, emitting any X leftover path).

mod buffer;
mod image2d;

pub use buffer::CLMemoryOpBufferHelper;
pub use image2d::CLMemoryOpImage2dHelper;

use crate::error::Result;
use crate::sampler::{Tensor3dMapper, TensorSampler, TensorSamplerAddressMode};
use crate::tensor::TensorArgument;
use crate::tile::{TileView, VectorTile};
use crate::types::{MemoryOperation, TensorStorageType};

/// Three-step protocol every memory helper follows.
pub trait MemoryOpHelper {
    fn initialize(&mut self, x: &str, z: &str, batch: &str) -> Result<()>;
    fn write_row(&mut self, row: i32, coord_y: &str) -> Result<()>;
    fn finalize(&mut self) -> Result<()>;
}

/// Everything a helper reads from and writes to.
pub struct MemoryOpContext<'a> {
    pub(crate) code: &'a mut String,
    pub(crate) mapper: Tensor3dMapper<'a>,
    pub(crate) sampler: TensorSampler,
    pub(crate) op: MemoryOperation,
    pub(crate) dst: TileView<'a, dyn VectorTile>,
}

impl<'a> MemoryOpContext<'a> {
    pub fn new(
        code: &'a mut String,
        tensor: &'a mut dyn TensorArgument,
        sampler: TensorSampler,
        op: MemoryOperation,
        dst: TileView<'a, dyn VectorTile>,
    ) -> Self {
        MemoryOpContext {
            code,
            mapper: Tensor3dMapper::new(tensor, sampler.format()),
            sampler,
            op,
            dst,
        }
    }

    fn append(&mut self, text: &str) {
        self.code.push_str(text);
    }
}

/// Helper selected by the sampler's storage kind.
pub enum CLMemoryOpHelper<'a> {
    Buffer(CLMemoryOpBufferHelper<'a>),
    Image2d(CLMemoryOpImage2dHelper<'a>),
}

pub fn create_memory_op_helper(ctx: MemoryOpContext<'_>) -> CLMemoryOpHelper<'_> {
    match ctx.sampler.storage() {
        TensorStorageType::BufferUint8Ptr => {
            CLMemoryOpHelper::Buffer(CLMemoryOpBufferHelper::new(ctx))
        }
        TensorStorageType::Texture2dReadOnly | TensorStorageType::Texture2dWriteOnly => {
            CLMemoryOpHelper::Image2d(CLMemoryOpImage2dHelper::new(ctx))
        }
    }
}

impl MemoryOpHelper for CLMemoryOpHelper<'_> {
    fn initialize(&mut self, x: &str, z: &str, batch: &str) -> Result<()> {
        match self {
            CLMemoryOpHelper::Buffer(h) => h.initialize(x, z, batch),
            CLMemoryOpHelper::Image2d(h) => h.initialize(x, z, batch),
        }
    }

    fn write_row(&mut self, row: i32, coord_y: &str) -> Result<()> {
        match self {
            CLMemoryOpHelper::Buffer(h) => h.write_row(row, coord_y),
            CLMemoryOpHelper::Image2d(h) => h.write_row(row, coord_y),
        }
    }

    fn finalize(&mut self) -> Result<()> {
        match self {
            CLMemoryOpHelper::Buffer(h) => h.finalize(),
            CLMemoryOpHelper::Image2d(h) => h.finalize(),
        }
    }
}

// ─── Guard rendering ──────────────────────────────────────────────

/// Condition of a bounds guard for `coord` against `[0, max)`.
/// `max` is only evaluated when the mode checks the upper edge.
pub(crate) fn guard_condition(
    mode: TensorSamplerAddressMode,
    coord: &str,
    max: impl FnOnce() -> Result<String>,
) -> Result<Option<String>> {
    let cond = match (mode.checks_min_edge(), mode.checks_max_edge()) {
        (true, true) => format!("({} >= 0) && ({} < {})", coord, coord, max()?),
        (true, false) => format!("{} >= 0", coord),
        (false, true) => format!("{} < {}", coord, max()?),
        (false, false) => return Ok(None),
    };
    Ok(Some(cond))
}

/// Coordinate rewritten by the clamping modes; unchanged otherwise.
pub(crate) fn clamp_coordinate(
    mode: TensorSamplerAddressMode,
    coord: &str,
    max: impl FnOnce() -> Result<String>,
) -> Result<String> {
    Ok(match mode {
        TensorSamplerAddressMode::ClampToNearest => {
            format!("clamp({}, 0, {} - 1)", coord, max()?)
        }
        TensorSamplerAddressMode::ClampToMaxEdgeOnly => format!("min({}, {} - 1)", coord, max()?),
        TensorSamplerAddressMode::ClampToMinEdgeOnly => format!("max({}, 0)", coord),
        _ => coord.to_string(),
    })
}

#[cfg(test)]
mod tests;
