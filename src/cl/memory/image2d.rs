use tracing::trace;

use super::{guard_condition, MemoryOpContext, MemoryOpHelper};
use crate::cl::helpers::is_zero_literal;
use crate::error::{precondition, Result};
use crate::sampler::{TensorSamplerAddressMode, TensorSamplerAddressModeX};
use crate::types::{DataType, MemoryOperation, TensorStorageType};

/// Loads and stores through an `image2d_t`, four texels per pixel.
pub struct CLMemoryOpImage2dHelper<'a> {
    ctx: MemoryOpContext<'a>,
    coord_x: String,
    coord_z: String,
    coord_b: String,
}

impl<'a> CLMemoryOpImage2dHelper<'a> {
    pub fn new(ctx: MemoryOpContext<'a>) -> Self {
        CLMemoryOpImage2dHelper {
            ctx,
            coord_x: String::new(),
            coord_z: String::new(),
            coord_b: String::new(),
        }
    }

    fn validate(&self) -> Result<()> {
        let sampler = &self.ctx.sampler;
        let dst = &self.ctx.dst;
        precondition!(
            dst.width() == 4,
            "image2d access requires a tile width of 4, got {}",
            dst.width()
        );
        precondition!(
            sampler.address_mode_x() == TensorSamplerAddressModeX::None,
            "image2d access does not support address mode x {:?}",
            sampler.address_mode_x()
        );
        precondition!(
            sampler.address_mode_z() == TensorSamplerAddressMode::None,
            "image2d access does not support address mode z {:?}",
            sampler.address_mode_z()
        );
        precondition!(
            matches!(dst.data_type(), DataType::Fp32 | DataType::Fp16),
            "image2d access requires fp32 or fp16 tiles, got {}",
            dst.data_type()
        );
        let expected = match self.ctx.op {
            MemoryOperation::Load => TensorStorageType::Texture2dReadOnly,
            MemoryOperation::Store => TensorStorageType::Texture2dWriteOnly,
        };
        precondition!(
            sampler.storage() == expected,
            "{:?} through {:?} storage",
            self.ctx.op,
            sampler.storage()
        );
        Ok(())
    }

    fn out_of_bound_initialize_y(&mut self, coord: &str) -> Result<()> {
        let mode = self.ctx.sampler.address_mode_y();
        if !mode.is_skip() {
            return Ok(());
        }
        let mapper = &mut self.ctx.mapper;
        if let Some(cond) = guard_condition(mode, coord, || Ok(mapper.dim_y()?.str))? {
            self.ctx.append(&format!("if({})\n{{\n", cond));
        }
        Ok(())
    }

    fn out_of_bound_finalize_y(&mut self) {
        if self.ctx.sampler.address_mode_y().is_skip() {
            self.ctx.append("}\n");
        }
    }

    fn to_sampler(&self) -> &'static str {
        use TensorSamplerAddressMode as M;
        match self.ctx.sampler.address_mode_y() {
            M::None => "CLK_NORMALIZED_COORDS_FALSE | CLK_ADDRESS_NONE | CLK_FILTER_NEAREST",
            M::Skip
            | M::SkipMinEdgeOnly
            | M::SkipMaxEdgeOnly
            | M::ClampToBorder
            | M::ClampToBorderMinEdgeOnly
            | M::ClampToBorderMaxEdgeOnly => {
                "CLK_NORMALIZED_COORDS_FALSE | CLK_ADDRESS_CLAMP | CLK_FILTER_NEAREST"
            }
            M::ClampToNearest | M::ClampToMaxEdgeOnly | M::ClampToMinEdgeOnly => {
                "CLK_NORMALIZED_COORDS_FALSE | CLK_ADDRESS_CLAMP_TO_EDGE | CLK_FILTER_NEAREST"
            }
        }
    }

    fn to_address(&mut self, y: &str) -> Result<String> {
        let mut coord_y = if is_zero_literal(y) {
            "0".to_string()
        } else {
            y.to_string()
        };
        if !is_zero_literal(&self.coord_z) && !self.ctx.mapper.is_one_z() {
            let dim_y = self.ctx.mapper.dim_y()?.str;
            coord_y.push_str(&format!(" + ({}) * {}", self.coord_z, dim_y));
        }
        if !is_zero_literal(&self.coord_b) && !self.ctx.mapper.is_one_batch() {
            let dim_y = self.ctx.mapper.dim_y()?.str;
            let dim_z = self.ctx.mapper.dim_z()?.str;
            coord_y.push_str(&format!(" + ({}) * {} * {}", self.coord_b, dim_y, dim_z));
        }
        Ok(format!("(int2)(({}) >> 2, ({}))", self.coord_x, coord_y))
    }
}

impl MemoryOpHelper for CLMemoryOpImage2dHelper<'_> {
    fn initialize(&mut self, x: &str, z: &str, batch: &str) -> Result<()> {
        self.validate()?;
        self.coord_x = x.to_string();
        self.coord_z = z.to_string();
        self.coord_b = batch.to_string();
        Ok(())
    }

    fn write_row(&mut self, row: i32, coord_y: &str) -> Result<()> {
        trace!(row, coord_y, "image2d row");
        self.out_of_bound_initialize_y(coord_y)?;

        let data = self.ctx.dst.vector(row)?.str;
        let sampler = self.to_sampler();
        let coord = self.to_address(coord_y)?;
        let storage = self.ctx.sampler.storage();
        let image = self.ctx.mapper.tensor().storage(storage).val;
        let suffix = if self.ctx.dst.data_type() == DataType::Fp32 {
            "f"
        } else {
            "h"
        };

        let statement = match self.ctx.op {
            MemoryOperation::Load => format!(
                "{} = read_image{}({}, {}, {});\n",
                data, suffix, image, sampler, coord
            ),
            MemoryOperation::Store => {
                format!("write_image{}({}, {}, {});\n", suffix, image, coord, data)
            }
        };
        self.ctx.append(&statement);

        self.out_of_bound_finalize_y();
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
