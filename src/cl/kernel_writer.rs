//! OpenCL C kernel writer.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, trace};

use super::helpers::{
    cl_assignment_op, cl_binary_op, cl_data_type, cl_ternary_op, cl_unary_op, is_one_literal,
    is_valid_identifier,
};
use super::memory::{create_memory_op_helper, MemoryOpContext, MemoryOpHelper};
use crate::config::WriterConfig;
use crate::error::{precondition, KernelWriterError, Result};
use crate::sampler::TensorSampler;
use crate::tensor::{CLTensorArgument, TensorArgument, TensorInfo};
use crate::tile::{
    CLConstantTile, CLTile, CLTileEntry, ScalarTile, TileInfo, TileView, VectorTile,
};
use crate::types::{
    AssignmentOp, BinaryOp, ConstantData, ConvertPolicy, DataType, MemoryOperation,
    TargetLanguage, TensorComponentType, TernaryOp, UnaryOp,
};
use crate::writer::registry::TileRegistry;
use crate::writer::{Body, Kernel, KernelArgument, KernelWriter, TensorOperand, TileOperand, TileSource};

const CL_EXTENSIONS: &str = "
#if defined(cl_khr_fp16)
#pragma OPENCL EXTENSION cl_khr_fp16 : enable
#endif // defined(cl_khr_fp16)

#if defined(cl_arm_printf)
#pragma OPENCL EXTENSION cl_arm_printf : enable
#endif // defined(cl_arm_printf);

#define inf (INFINITY)
";

/// Tags operands with the writer that created them.
static NEXT_WRITER_ID: AtomicU32 = AtomicU32::new(0);

type CLTileView<'a> = TileView<'a, dyn VectorTile>;

pub struct CLKernelWriter {
    writer_id: u32,
    config: WriterConfig,
    id_space: i32,
    last_id_space: i32,
    code: String,
    tiles: TileRegistry,
    constants: Vec<CLConstantTile>,
    tensors: Vec<CLTensorArgument>,
    /// Body length right after the last closed if/else-if block.
    if_chain_end: Option<usize>,
}

impl CLKernelWriter {
    pub fn new(config: WriterConfig) -> Self {
        CLKernelWriter {
            writer_id: NEXT_WRITER_ID.fetch_add(1, Ordering::Relaxed),
            config,
            id_space: 0,
            last_id_space: 0,
            code: String::new(),
            tiles: TileRegistry::new(),
            constants: Vec::new(),
            tensors: Vec::new(),
            if_chain_end: None,
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Tensor arguments in declaration order.
    pub fn tensors(&self) -> &[CLTensorArgument] {
        &self.tensors
    }

    fn append(&mut self, text: &str) {
        self.code.push_str(text);
    }

    /// `G{id_space}__{name}`.
    fn full_name(&self, name: &str) -> String {
        format!("G{}__{}", self.id_space, name)
    }

    // ─── Operand resolution ───────────────────────────────────────

    fn resolve_tile(&self, operand: &TileOperand) -> Result<&(dyn VectorTile + 'static)> {
        if operand.writer != self.writer_id {
            return Err(KernelWriterError::TileNotFound);
        }
        let tile: &(dyn VectorTile + 'static) = match operand.source {
            TileSource::Variable { slot, serial } => self.tiles.get(slot, serial)?,
            TileSource::Constant(index) => self
                .constants
                .get(index)
                .ok_or(KernelWriterError::TileNotFound)?,
            TileSource::Component { tensor, component } => self
                .tensors
                .get(tensor)
                .and_then(|t| t.find_component(component))
                .map(|c| c.tile())
                .ok_or(KernelWriterError::TileNotFound)?,
        };
        Ok(tile)
    }

    fn view(&self, operand: &TileOperand) -> Result<CLTileView<'_>> {
        TileView::with_area(self.resolve_tile(operand)?, operand.area())
    }

    /// Owned copy of the tile behind `operand`, for operations that also
    /// need mutable access to a tensor.
    fn tile_entry(&self, operand: &TileOperand) -> Result<CLTileEntry> {
        if operand.writer != self.writer_id {
            return Err(KernelWriterError::TileNotFound);
        }
        match operand.source {
            TileSource::Constant(index) => self
                .constants
                .get(index)
                .cloned()
                .map(CLTileEntry::Constant)
                .ok_or(KernelWriterError::TileNotFound),
            TileSource::Variable { slot, serial } => {
                Ok(CLTileEntry::Variable(self.tiles.get(slot, serial)?.clone()))
            }
            TileSource::Component { tensor, component } => self
                .tensors
                .get(tensor)
                .and_then(|t| t.find_component(component))
                .map(|c| CLTileEntry::Variable(c.tile().clone()))
                .ok_or(KernelWriterError::TileNotFound),
        }
    }

    fn tensor_index(&self, operand: &TensorOperand) -> Result<usize> {
        if operand.writer != self.writer_id || operand.index >= self.tensors.len() {
            return Err(KernelWriterError::TensorNotFound);
        }
        Ok(operand.index)
    }

    fn scalar_expr(&self, operand: &TileOperand, what: &str) -> Result<String> {
        let view = self.view(operand)?;
        precondition!(view.is_scalar(), "{} must be a scalar tile", what);
        Ok(view.scalar(0, 0).str)
    }

    // ─── Emission helpers ─────────────────────────────────────────

    /// Run `body` inside `{ … }` with its own tile scope.
    fn write_block(&mut self, body: Body<'_>) -> Result<()> {
        self.compound_statement_begin();
        body(&mut *self)?;
        self.compound_statement_end()
    }

    fn op_if_generic(
        &mut self,
        lhs: &TileOperand,
        op: BinaryOp,
        rhs: &TileOperand,
        body: Body<'_>,
        is_else_if: bool,
    ) -> Result<()> {
        let header = {
            let lhs_view = self.view(lhs)?;
            let rhs_view = self.view(rhs)?;
            precondition!(op.is_relational(), "if condition must be relational, got {:?}", op);
            precondition!(lhs_view.is_scalar(), "if operands must be scalar tiles");
            precondition!(rhs_view.is_scalar(), "if operands must be scalar tiles");
            let (_, op_name) = cl_binary_op(op, lhs_view.data_type())?;
            format!(
                "if ({} {} {})\n",
                lhs_view.scalar(0, 0).str,
                op_name,
                rhs_view.scalar(0, 0).str
            )
        };
        if is_else_if {
            self.check_else()?;
            self.append("else ");
        }
        self.append(&header);
        self.write_block(body)?;
        self.if_chain_end = Some(self.code.len());
        Ok(())
    }

    fn check_else(&self) -> Result<()> {
        if self.if_chain_end != Some(self.code.len()) {
            return Err(KernelWriterError::ElseWithoutIf);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn op_load_store(
        &mut self,
        op: MemoryOperation,
        tile: &TileOperand,
        tensor: &TensorOperand,
        sampler: &TensorSampler,
        coords: [&TileOperand; 4],
        dilation: Option<(&TileOperand, &TileOperand)>,
        indirect: bool,
    ) -> Result<()> {
        let [x, y, z, batch] = coords;

        let dilation_y = match dilation {
            Some((dil_x, dil_y)) => {
                let dil_x = self.scalar_expr(dil_x, "dilation in x")?;
                if !is_one_literal(&dil_x) {
                    return Err(KernelWriterError::unsupported("dilation in x", dil_x));
                }
                Some(self.scalar_expr(dil_y, "dilation in y")?).filter(|d| !is_one_literal(d))
            }
            None => None,
        };

        let tensor_index = self.tensor_index(tensor)?;
        let x = self.scalar_expr(x, "x coordinate")?;
        let z = self.scalar_expr(z, "z coordinate")?;
        let batch = self.scalar_expr(batch, "batch coordinate")?;

        let height = self.view(tile)?.height();
        let rows: Vec<String> = {
            let y_view = self.view(y)?;
            if indirect {
                precondition!(y_view.width() == 1, "indirect y tile must have width 1");
                (0..height).map(|row| y_view.scalar(row, 0).str).collect()
            } else {
                precondition!(y_view.is_scalar(), "y coordinate must be a scalar tile");
                let y = y_view.scalar(0, 0).str;
                (0..height)
                    .map(|row| match &dilation_y {
                        Some(dil) => format!("{} + {} * {}", y, row, dil),
                        None => format!("{} + {}", y, row),
                    })
                    .collect()
            }
        };

        let entry = self.tile_entry(tile)?;
        if op == MemoryOperation::Load && !entry.is_assignable() {
            return Err(KernelWriterError::NotAssignable(entry.name().to_string()));
        }

        let Self { code, tensors, .. } = self;
        let dst: CLTileView<'_> = TileView::with_area(&entry as &dyn VectorTile, tile.area())?;
        let tensor: &mut dyn TensorArgument = &mut tensors[tensor_index];
        trace!(tensor = %tensor.name(), ?op, rows = rows.len(), "memory operation");
        let ctx = MemoryOpContext::new(code, tensor, *sampler, op, dst);
        let mut helper = create_memory_op_helper(ctx);
        helper.initialize(&x, &z, &batch)?;
        for (row, coord_y) in rows.iter().enumerate() {
            helper.write_row(row as i32, coord_y)?;
        }
        helper.finalize()
    }
}

// ─── Shape checks ─────────────────────────────────────────────────

fn check_assignable(view: &CLTileView<'_>) -> Result<()> {
    if !view.is_assignable() {
        return Err(KernelWriterError::NotAssignable(view.name().to_string()));
    }
    Ok(())
}

/// Operand rows/lanes must match the destination or be 1 (broadcast).
fn check_broadcast(what: &str, operand: &CLTileView<'_>, dst: &CLTileView<'_>) -> Result<()> {
    precondition!(
        operand.height() == dst.height() || operand.height() == 1,
        "{} tile height must match the destination or be 1",
        what
    );
    precondition!(
        operand.width() == dst.width() || operand.width() == 1,
        "{} tile width must match the destination or be 1",
        what
    );
    Ok(())
}

/// `(typeN)` when a single lane is spread across a wider destination.
fn broadcast_prefix(dst_type: &str, dst_width: i32, operand_width: i32) -> String {
    if dst_width != 1 && operand_width == 1 {
        format!("({})", dst_type)
    } else {
        String::new()
    }
}

fn print_format(data_type: DataType, width: i32) -> String {
    let spec = match data_type {
        DataType::Fp32 => "hlg",
        DataType::Fp16 => "hg",
        DataType::Int32 | DataType::Bool if width > 1 => "hli",
        DataType::Int32 | DataType::Bool => "i",
        DataType::Int16 => "hi",
        DataType::Int8 => "hhi",
        DataType::Uint32 if width > 1 => "hlu",
        DataType::Uint32 => "u",
        DataType::Uint16 => "hu",
        DataType::Uint8 => "hhu",
    };
    if width > 1 {
        format!("[%v{}{}]", width, spec)
    } else {
        format!("%{}", spec)
    }
}

impl KernelWriter for CLKernelWriter {
    fn target_language(&self) -> TargetLanguage {
        TargetLanguage::OpenCL
    }

    // ─── ID spaces ────────────────────────────────────────────────

    fn id_space(&self) -> i32 {
        self.id_space
    }

    fn set_id_space(&mut self, id: i32) -> Result<()> {
        precondition!(
            id >= 0 && id <= self.last_id_space,
            "id space {} has not been allocated (last is {})",
            id,
            self.last_id_space
        );
        debug!(from = self.id_space, to = id, "set id space");
        self.id_space = id;
        Ok(())
    }

    fn next_id_space(&mut self) -> i32 {
        self.last_id_space += 1;
        self.id_space = self.last_id_space;
        debug!(id_space = self.id_space, "next id space");
        self.id_space
    }

    // ─── Scopes ───────────────────────────────────────────────────

    fn compound_statement_begin(&mut self) {
        self.append("{\n");
        self.tiles.begin_scope();
        debug!(depth = self.tiles.depth(), "compound statement begin");
    }

    fn compound_statement_end(&mut self) -> Result<()> {
        let dropped = self.tiles.end_scope()?;
        self.append("}\n");
        debug!(depth = self.tiles.depth(), dropped, "compound statement end");
        Ok(())
    }

    // ─── Declarations ─────────────────────────────────────────────

    fn declare_tile(&mut self, name: &str, info: TileInfo) -> Result<TileOperand> {
        precondition!(is_valid_identifier(name), "'{}' is not a valid tile name", name);
        let tile = CLTile::new(self.full_name(name), info)?;
        let declarations = tile.declarations();
        let (slot, serial) = self.tiles.declare(self.id_space, name, tile)?;
        self.append(&declarations);
        TileOperand::new(
            self.writer_id,
            TileSource::Variable { slot, serial },
            info.height,
            info.width,
        )
    }

    fn declare_constant_tile(&mut self, data: &ConstantData) -> Result<TileOperand> {
        let tile = CLConstantTile::new(data)?;
        let info = *tile.info();
        self.constants.push(tile);
        TileOperand::new(
            self.writer_id,
            TileSource::Constant(self.constants.len() - 1),
            info.height,
            info.width,
        )
    }

    fn declare_tensor_argument(&mut self, name: &str, info: TensorInfo) -> Result<TensorOperand> {
        let full_name = self.full_name(name);
        if info.is_virtual() {
            return Err(KernelWriterError::VirtualTensor {
                name: full_name,
                id: info.id(),
            });
        }
        precondition!(
            info.has_valid_shape(),
            "tensor {} has invalid shape {:?}",
            full_name,
            info.shape()
        );
        if self.tensors.iter().any(|t| t.name() == full_name) {
            return Err(KernelWriterError::DuplicateTensor(full_name));
        }
        if self.tensors.iter().any(|t| t.info().id() == info.id()) {
            return Err(KernelWriterError::DuplicateTensorId(info.id()));
        }
        debug!(tensor = %full_name, id = info.id(), data_type = %info.data_type(), "declare tensor argument");
        self.tensors.push(CLTensorArgument::new(
            full_name,
            info,
            self.config.return_dims_by_value,
        ));
        Ok(TensorOperand {
            writer: self.writer_id,
            index: self.tensors.len() - 1,
        })
    }

    fn tensor_component(
        &mut self,
        tensor: &TensorOperand,
        component: TensorComponentType,
    ) -> Result<TileOperand> {
        let index = self.tensor_index(tensor)?;
        self.tensors[index].cl_component(component)?;
        TileOperand::new(
            self.writer_id,
            TileSource::Component {
                tensor: index,
                component,
            },
            1,
            1,
        )
    }

    // ─── Elementwise ──────────────────────────────────────────────

    fn op_assign(&mut self, dst: &TileOperand, src: &TileOperand) -> Result<()> {
        let code = {
            let dst_view = self.view(dst)?;
            let src_view = self.view(src)?;
            check_assignable(&dst_view)?;
            precondition!(
                src_view.data_type() == dst_view.data_type(),
                "source and destination type must match"
            );
            check_broadcast("source", &src_view, &dst_view)?;

            let dst_type = cl_data_type(dst_view.data_type(), dst_view.width());
            let prefix = broadcast_prefix(&dst_type, dst_view.width(), src_view.width());
            let mut code = String::new();
            for y in 0..dst_view.height() {
                code += &format!("{} = {}{};\n", dst_view.vector(y)?.str, prefix, src_view.vector(y)?.str);
            }
            code
        };
        self.append(&code);
        Ok(())
    }

    fn op_cast(&mut self, dst: &TileOperand, src: &TileOperand, policy: ConvertPolicy) -> Result<()> {
        let code = {
            let dst_view = self.view(dst)?;
            let src_view = self.view(src)?;
            check_assignable(&dst_view)?;
            let dst_type = dst_view.data_type();
            precondition!(
                !(policy == ConvertPolicy::Saturate && dst_type.is_float()),
                "saturating conversion to {} is not supported",
                dst_type
            );
            check_broadcast("source", &src_view, &dst_view)?;

            let convert_type = cl_data_type(dst_type, src_view.width());
            let dst_type_str = cl_data_type(dst_type, dst_view.width());
            let prefix = broadcast_prefix(&dst_type_str, dst_view.width(), src_view.width());
            let sat = if policy == ConvertPolicy::Saturate { "_sat" } else { "" };

            let mut code = String::new();
            for y in 0..dst_view.height() {
                let dst_row = dst_view.vector(y)?.str;
                let src_row = src_view.vector(y)?.str;
                if src_view.data_type() == dst_type {
                    code += &format!("{} = {};\n", dst_row, src_row);
                } else {
                    code += &format!("{} = {}convert_{}{}({});\n", dst_row, prefix, convert_type, sat, src_row);
                }
            }
            code
        };
        self.append(&code);
        Ok(())
    }

    fn op_unary(&mut self, dst: &TileOperand, op: UnaryOp, src: &TileOperand) -> Result<()> {
        let code = {
            let dst_view = self.view(dst)?;
            let src_view = self.view(src)?;
            check_assignable(&dst_view)?;
            precondition!(
                src_view.data_type() == dst_view.data_type(),
                "source and destination type must match"
            );
            check_broadcast("source", &src_view, &dst_view)?;

            let dst_type = cl_data_type(dst_view.data_type(), dst_view.width());
            let prefix = broadcast_prefix(&dst_type, dst_view.width(), src_view.width());
            let (is_func, name) = cl_unary_op(op);
            let (open, close) = if is_func {
                (format!("{}(", name), ")")
            } else {
                (name.to_string(), "")
            };

            let mut code = String::new();
            for y in 0..dst_view.height() {
                code += &format!(
                    "{} = {}{}{}{};\n",
                    dst_view.vector(y)?.str,
                    prefix,
                    open,
                    src_view.vector(y)?.str,
                    close
                );
            }
            code
        };
        self.append(&code);
        Ok(())
    }

    fn op_binary(
        &mut self,
        dst: &TileOperand,
        op: BinaryOp,
        lhs: &TileOperand,
        rhs: &TileOperand,
    ) -> Result<()> {
        let code = {
            let dst_view = self.view(dst)?;
            let lhs_view = self.view(lhs)?;
            let rhs_view = self.view(rhs)?;
            check_assignable(&dst_view)?;
            precondition!(
                lhs_view.data_type() == rhs_view.data_type(),
                "LHS and RHS type must match"
            );
            let data_type = lhs_view.data_type();
            let (dst_h, dst_w) = (dst_view.height(), dst_view.width());
            let mut code = String::new();

            if op == BinaryOp::MatMulNtT {
                precondition!(lhs_view.height() == dst_h, "LHS tile height must match the destination height");
                precondition!(rhs_view.height() == dst_w, "RHS tile height must match the destination width");
                precondition!(lhs_view.width() == rhs_view.width(), "LHS and RHS tile widths must match");
                precondition!(data_type.is_float(), "matrix multiplication requires a float type");

                for y in 0..dst_h {
                    for x in 0..dst_w {
                        let acc = dst_view.scalar(y, x).str;
                        for k in 0..lhs_view.width() {
                            code += &format!(
                                "{} = fma({}, {}, {});\n",
                                acc,
                                lhs_view.scalar(y, k).str,
                                rhs_view.scalar(x, k).str,
                                acc
                            );
                        }
                    }
                }
            } else {
                check_broadcast("LHS", &lhs_view, &dst_view)?;
                check_broadcast("RHS", &rhs_view, &dst_view)?;

                let (is_func, name) = cl_binary_op(op, data_type)?;
                let type_str = cl_data_type(data_type, dst_w);
                let lhs_prefix = broadcast_prefix(&type_str, dst_w, lhs_view.width());
                let rhs_prefix = broadcast_prefix(&type_str, dst_w, rhs_view.width());

                for y in 0..dst_h {
                    let dst_row = dst_view.vector(y)?.str;
                    let a = format!("{}{}", lhs_prefix, lhs_view.vector(y)?.str);
                    let b = format!("{}{}", rhs_prefix, rhs_view.vector(y)?.str);
                    if is_func {
                        code += &format!("{} = {}({}, {});\n", dst_row, name, a, b);
                    } else {
                        code += &format!("{} = {} {} {};\n", dst_row, a, name, b);
                    }
                }
            }
            code
        };
        self.append(&code);
        Ok(())
    }

    fn op_ternary(
        &mut self,
        dst: &TileOperand,
        op: TernaryOp,
        first: &TileOperand,
        second: &TileOperand,
        third: &TileOperand,
    ) -> Result<()> {
        let code = {
            let dst_view = self.view(dst)?;
            let views = [self.view(first)?, self.view(second)?, self.view(third)?];
            check_assignable(&dst_view)?;
            precondition!(
                views[1].data_type() == dst_view.data_type(),
                "2nd source and destination type must match"
            );
            precondition!(
                views[2].data_type() == dst_view.data_type(),
                "3rd source and destination type must match"
            );
            for (what, view) in ["1st", "2nd", "3rd"].iter().zip(&views) {
                check_broadcast(what, view, &dst_view)?;
            }

            let (_, name) = cl_ternary_op(op);
            let dst_type = cl_data_type(dst_view.data_type(), dst_view.width());
            let mut code = String::new();
            for y in 0..dst_view.height() {
                let args = views
                    .iter()
                    .map(|v| -> Result<String> {
                        Ok(format!(
                            "{}{}",
                            broadcast_prefix(&dst_type, dst_view.width(), v.width()),
                            v.vector(y)?.str
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?;
                code += &format!("{} = {}({});\n", dst_view.vector(y)?.str, name, args.join(", "));
            }
            code
        };
        self.append(&code);
        Ok(())
    }

    // ─── Control flow ─────────────────────────────────────────────

    fn op_if(&mut self, lhs: &TileOperand, op: BinaryOp, rhs: &TileOperand, body: Body<'_>) -> Result<()> {
        self.op_if_generic(lhs, op, rhs, body, false)
    }

    fn op_else_if(
        &mut self,
        lhs: &TileOperand,
        op: BinaryOp,
        rhs: &TileOperand,
        body: Body<'_>,
    ) -> Result<()> {
        self.op_if_generic(lhs, op, rhs, body, true)
    }

    fn op_else(&mut self, body: Body<'_>) -> Result<()> {
        self.check_else()?;
        self.append("else\n");
        self.write_block(body)?;
        self.if_chain_end = None;
        Ok(())
    }

    fn op_for_loop(
        &mut self,
        var: &TileOperand,
        cond_op: BinaryOp,
        cond_value: &TileOperand,
        update_var: &TileOperand,
        update_op: AssignmentOp,
        update_value: &TileOperand,
        body: Body<'_>,
    ) -> Result<()> {
        let header = {
            let var_view = self.view(var)?;
            let cond_view = self.view(cond_value)?;
            let update_var_view = self.view(update_var)?;
            let update_value_view = self.view(update_value)?;

            precondition!(
                var_view.is_scalar()
                    && cond_view.is_scalar()
                    && update_var_view.is_scalar()
                    && update_value_view.is_scalar(),
                "for loop operands must be scalar tiles"
            );
            precondition!(
                var_view.data_type() == cond_view.data_type(),
                "loop variable and condition value type must match"
            );
            precondition!(
                update_var_view.data_type() == update_value_view.data_type(),
                "update variable and update value type must match"
            );
            precondition!(cond_op.is_relational(), "loop condition must be relational, got {:?}", cond_op);
            check_assignable(&update_var_view)?;

            let (_, cond_name) = cl_binary_op(cond_op, var_view.data_type())?;
            format!(
                "for (; {} {} {}; {} {} {})\n",
                var_view.scalar(0, 0).str,
                cond_name,
                cond_view.scalar(0, 0).str,
                update_var_view.scalar(0, 0).str,
                cl_assignment_op(update_op),
                update_value_view.scalar(0, 0).str
            )
        };
        self.append(&header);
        self.write_block(body)
    }

    fn op_return(&mut self) {
        self.append("return;\n");
    }

    // ─── Misc ─────────────────────────────────────────────────────

    fn op_get_global_id(&mut self, dst: &TileOperand, dim: i32) -> Result<()> {
        let code = {
            let view = self.view(dst)?;
            check_assignable(&view)?;
            precondition!(view.is_scalar(), "global id destination must be a scalar tile");
            precondition!(
                matches!(view.data_type(), DataType::Int32 | DataType::Uint32),
                "global id destination must be int32 or uint32, got {}",
                view.data_type()
            );
            precondition!((0..=2).contains(&dim), "global id dimension {} out of range 0..=2", dim);
            format!("{} = get_global_id({});\n", view.scalar(0, 0).str, dim)
        };
        self.append(&code);
        Ok(())
    }

    fn op_print(&mut self, prefix: &str, operands: &[TileOperand]) -> Result<()> {
        let mut format_code = String::new();
        let mut args_code = String::new();
        for operand in operands {
            let view = self.view(operand)?;
            let row_format = print_format(view.data_type(), view.width());

            format_code += view.name();
            format_code += " = ";
            if view.height() == 1 {
                format_code += &row_format;
            } else {
                let rows = vec![row_format; view.height() as usize];
                format_code += &format!("[{}]", rows.join(", "));
            }
            format_code += "\\n";

            for row in 0..view.height() {
                args_code += ", ";
                args_code += &view.vector(row)?.str;
            }
        }
        let code = format!("printf(\"{}\\n{}\"{});\n", prefix, format_code, args_code);
        self.append(&code);
        Ok(())
    }

    fn op_comment(&mut self, text: &str) -> Result<()> {
        precondition!(
            !text.contains('\n') && !text.contains('\r'),
            "comment text must be a single line"
        );
        if self.config.debug_comments {
            self.append(&format!("// {}\n", text));
        }
        Ok(())
    }

    fn op_write_raw_code(&mut self, code: &str) {
        self.append(code);
    }

    // ─── Memory ───────────────────────────────────────────────────

    fn op_load(
        &mut self,
        tile: &TileOperand,
        tensor: &TensorOperand,
        sampler: &TensorSampler,
        x: &TileOperand,
        y: &TileOperand,
        z: &TileOperand,
        batch: &TileOperand,
    ) -> Result<()> {
        self.op_load_store(MemoryOperation::Load, tile, tensor, sampler, [x, y, z, batch], None, false)
    }

    fn op_load_dilated(
        &mut self,
        tile: &TileOperand,
        tensor: &TensorOperand,
        sampler: &TensorSampler,
        x: &TileOperand,
        y: &TileOperand,
        z: &TileOperand,
        batch: &TileOperand,
        dilation_x: &TileOperand,
        dilation_y: &TileOperand,
    ) -> Result<()> {
        self.op_load_store(
            MemoryOperation::Load,
            tile,
            tensor,
            sampler,
            [x, y, z, batch],
            Some((dilation_x, dilation_y)),
            false,
        )
    }

    fn op_load_indirect(
        &mut self,
        tile: &TileOperand,
        tensor: &TensorOperand,
        sampler: &TensorSampler,
        x: &TileOperand,
        y: &TileOperand,
        z: &TileOperand,
        batch: &TileOperand,
    ) -> Result<()> {
        self.op_load_store(MemoryOperation::Load, tile, tensor, sampler, [x, y, z, batch], None, true)
    }

    fn op_store(
        &mut self,
        tensor: &TensorOperand,
        tile: &TileOperand,
        sampler: &TensorSampler,
        x: &TileOperand,
        y: &TileOperand,
        z: &TileOperand,
        batch: &TileOperand,
    ) -> Result<()> {
        self.op_load_store(MemoryOperation::Store, tile, tensor, sampler, [x, y, z, batch], None, false)
    }

    fn op_store_dilated(
        &mut self,
        tensor: &TensorOperand,
        tile: &TileOperand,
        sampler: &TensorSampler,
        x: &TileOperand,
        y: &TileOperand,
        z: &TileOperand,
        batch: &TileOperand,
        dilation_x: &TileOperand,
        dilation_y: &TileOperand,
    ) -> Result<()> {
        self.op_load_store(
            MemoryOperation::Store,
            tile,
            tensor,
            sampler,
            [x, y, z, batch],
            Some((dilation_x, dilation_y)),
            false,
        )
    }

    // ─── Output ───────────────────────────────────────────────────

    fn emit_kernel(&mut self, name: &str) -> Result<Kernel> {
        if !is_valid_identifier(name) {
            return Err(KernelWriterError::InvalidKernelName(name.to_string()));
        }
        if self.tiles.depth() != 0 {
            return Err(KernelWriterError::UnbalancedScope(
                "kernel emitted with open compound statements",
            ));
        }

        let mut code = String::new();
        if self.config.emit_extensions {
            code += CL_EXTENSIONS;
        }
        code += &format!("__kernel void {}\n(\n", name);

        let mut arguments = Vec::new();
        for tensor in &self.tensors {
            let id = tensor.info().id();
            for storage in tensor.storages() {
                code += &format!("{} {},\n", storage.cl_type(), storage.val);
                arguments.push(KernelArgument::TensorStorage {
                    id,
                    storage: storage.storage_type,
                });
            }
            for component in tensor.components() {
                let tile = component.tile();
                code += &format!("{} {},\n", cl_data_type(tile.info().data_type, 1), tile.name());
                arguments.push(KernelArgument::TensorComponent {
                    id,
                    component: component.component_type(),
                });
            }
        }
        if code.ends_with(",\n") {
            code.truncate(code.len() - 2);
            code.push('\n');
        }

        code += ")\n{\n";
        code += &self.code;
        code += "}\n";

        debug!(kernel = name, arguments = arguments.len(), bytes = code.len(), "emit kernel");
        Ok(Kernel::new(TargetLanguage::OpenCL, arguments, code))
    }

    fn body_source_code(&self) -> &str {
        &self.code
    }
}
