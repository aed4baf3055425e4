use tracing::trace;

use super::{clamp_coordinate, guard_condition, MemoryOpContext, MemoryOpHelper};
use crate::cl::helpers::{cl_scalar_type, decompose_vector_width, is_zero_literal};
use crate::error::{KernelWriterError, Result};
use crate::sampler::TensorSamplerAddressModeX;
use crate::types::MemoryOperation;

/// Loads and stores through a `__global uchar*` with byte strides.
pub struct CLMemoryOpBufferHelper<'a> {
    ctx: MemoryOpContext<'a>,
    coord_x: String,
    coord_z: String,
    coord_orig_z: String,
    coord_b: String,
    ls_width_full: i32,
    /// Widths of the X leftover chunks; empty when no leftover path exists.
    ls_width_part: Vec<i32>,
    /// `(row, coord_y)` of every row written, replayed for the leftover path.
    leftover_rows: Vec<(i32, String)>,
}

impl<'a> CLMemoryOpBufferHelper<'a> {
    pub fn new(ctx: MemoryOpContext<'a>) -> Self {
        let ls_width_full = ctx.dst.width();
        CLMemoryOpBufferHelper {
            ctx,
            coord_x: String::new(),
            coord_z: String::new(),
            coord_orig_z: String::new(),
            coord_b: String::new(),
            ls_width_full,
            ls_width_part: Vec::new(),
            leftover_rows: Vec::new(),
        }
    }

    fn out_of_bound_initialize_x(&mut self) -> Result<()> {
        if self.ctx.sampler.address_mode_x() != TensorSamplerAddressModeX::OverlappingMin {
            return Ok(());
        }
        let dim0 = self
            .ctx
            .mapper
            .tensor_ref()
            .info()
            .static_dim(0)
            .ok_or_else(|| {
                KernelWriterError::unsupported("OverlappingMin with dynamic dimension", "dim0")
            })?;
        self.ls_width_part = decompose_vector_width(dim0 % self.ls_width_full);
        if !self.ls_width_part.is_empty() {
            let guard = format!("if({} > 0)\n{{\n", self.coord_x);
            self.ctx.append(&guard);
        }
        Ok(())
    }

    fn out_of_bound_finalize_x(&mut self) -> Result<()> {
        if self.ls_width_part.is_empty() {
            return Ok(());
        }
        self.ctx.append("}\nelse\n{\n");
        let orig_z = self.coord_orig_z.clone();
        self.out_of_bound_initialize_z(&orig_z)?;
        let rows = std::mem::take(&mut self.leftover_rows);
        let parts = self.ls_width_part.clone();
        for (row, coord_y) in &rows {
            let mut col_start = 0;
            for &width in &parts {
                let dst = self.ctx.dst.vector_range(*row, col_start, width)?.str;
                let coord_x = format!("{} + {}", self.coord_x, col_start);
                let coord_y = self.out_of_bound_initialize_y(coord_y)?;
                let address = self.to_buffer_address(&coord_x, &coord_y)?;
                let statement = to_statement(self.ctx.op, width, &dst, &address);
                self.ctx.append(&statement);
                self.out_of_bound_finalize_y(&dst);
                col_start += width;
            }
        }
        self.out_of_bound_finalize_z()?;
        self.ctx.append("}\n");
        Ok(())
    }

    /// Opens the Y guard and returns the coordinate to address with.
    fn out_of_bound_initialize_y(&mut self, coord: &str) -> Result<String> {
        let mode = self.ctx.sampler.address_mode_y();
        let mapper = &mut self.ctx.mapper;
        if let Some(cond) = guard_condition(mode, coord, || Ok(mapper.dim_y()?.str))? {
            self.ctx.append(&format!("if({})\n{{\n", cond));
            return Ok(coord.to_string());
        }
        let mapper = &mut self.ctx.mapper;
        clamp_coordinate(mode, coord, || Ok(mapper.dim_y()?.str))
    }

    fn out_of_bound_finalize_y(&mut self, dst: &str) {
        let mode = self.ctx.sampler.address_mode_y();
        if !mode.is_guarded() {
            return;
        }
        if mode.is_clamp_to_border() && self.ctx.op == MemoryOperation::Load {
            self.ctx.append(&format!("}}\nelse\n{{\n{} = 0;\n}}\n", dst));
        } else {
            self.ctx.append("}\n");
        }
    }

    fn out_of_bound_initialize_z(&mut self, coord: &str) -> Result<()> {
        let mode = self.ctx.sampler.address_mode_z();
        let mapper = &mut self.ctx.mapper;
        if let Some(cond) = guard_condition(mode, coord, || Ok(mapper.dim_z()?.str))? {
            self.ctx.append(&format!("if({})\n{{\n", cond));
            self.coord_z = coord.to_string();
            return Ok(());
        }
        let mapper = &mut self.ctx.mapper;
        self.coord_z = clamp_coordinate(mode, coord, || Ok(mapper.dim_z()?.str))?;
        Ok(())
    }

    fn out_of_bound_finalize_z(&mut self) -> Result<()> {
        let mode = self.ctx.sampler.address_mode_z();
        if !mode.is_guarded() {
            return Ok(());
        }
        if mode.is_clamp_to_border() && self.ctx.op == MemoryOperation::Load {
            self.ctx.append("}\nelse\n{\n");
            for row in 0..self.ctx.dst.height() {
                let dst = self.ctx.dst.vector(row)?.str;
                self.ctx.append(&format!("{} = 0;\n", dst));
            }
        }
        self.ctx.append("}\n");
        Ok(())
    }

    fn to_buffer_address(&mut self, x: &str, y: &str) -> Result<String> {
        let storage = self.ctx.sampler.storage();
        let ptr = self.ctx.mapper.tensor().storage(storage).val;
        let ty = cl_scalar_type(self.ctx.dst.data_type());

        let mut address = format!("(__global {}*)({}", ty, ptr);
        if !is_zero_literal(x) && !self.ctx.mapper.is_one_x() {
            address.push_str(&format!(" + ({}) * sizeof({})", x, ty));
        }
        if !is_zero_literal(y) {
            let stride_y = self.ctx.mapper.stride_y()?.str;
            address.push_str(&format!(" + ({}) * {}", y, stride_y));
        }
        if !is_zero_literal(&self.coord_z) && !self.ctx.mapper.is_one_z() {
            let stride_z = self.ctx.mapper.stride_z()?.str;
            address.push_str(&format!(" + ({}) * {}", self.coord_z, stride_z));
        }
        if !is_zero_literal(&self.coord_b) && !self.ctx.mapper.is_one_batch() {
            let stride_b = self.ctx.mapper.stride_batch()?.str;
            address.push_str(&format!(" + ({}) * {}", self.coord_b, stride_b));
        }
        address.push(')');
        Ok(address)
    }
}

fn to_statement(op: MemoryOperation, width: i32, data: &str, address: &str) -> String {
    match (op, width) {
        (MemoryOperation::Load, 1) => format!("{} = *({});\n", data, address),
        (MemoryOperation::Load, w) => format!("{} = vload{}(0, {});\n", data, w, address),
        (MemoryOperation::Store, 1) => format!("*({}) = {};\n", address, data),
        (MemoryOperation::Store, w) => format!("vstore{}({}, 0, {});\n", w, data, address),
    }
}

impl MemoryOpHelper for CLMemoryOpBufferHelper<'_> {
    fn initialize(&mut self, x: &str, z: &str, batch: &str) -> Result<()> {
        self.coord_x = x.to_string();
        self.coord_z = z.to_string();
        self.coord_orig_z = z.to_string();
        self.coord_b = batch.to_string();

        self.out_of_bound_initialize_x()?;
        self.out_of_bound_initialize_z(z)
    }

    fn write_row(&mut self, row: i32, coord_y: &str) -> Result<()> {
        trace!(row, coord_y, "buffer row");
        let y = self.out_of_bound_initialize_y(coord_y)?;

        let dst = self.ctx.dst.vector(row)?.str;
        let coord_x = self.coord_x.clone();
        let address = self.to_buffer_address(&coord_x, &y)?;
        let statement = to_statement(self.ctx.op, self.ls_width_full, &dst, &address);
        self.ctx.append(&statement);

        self.out_of_bound_finalize_y(&dst);

        if !self.ls_width_part.is_empty() {
            self.leftover_rows.push((row, coord_y.to_string()));
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.out_of_bound_finalize_z()?;
        self.out_of_bound_finalize_x()
    }
}
