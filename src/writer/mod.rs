//! The kernel writer: a typed, append-only builder of kernel source.
//!
//! Callers declare tiles and tensor arguments, then issue operations on the
//! returned operands. Every call appends text to the kernel body in call
//! order. `emit_kernel` wraps the body in a signature built from the tensor
//! storages and components the body actually used.

mod kernel;
mod operand;
pub(crate) mod registry;

pub use kernel::{Kernel, KernelArgument};
pub use operand::{TensorOperand, TileOperand};
pub(crate) use operand::TileSource;

use crate::cl::CLKernelWriter;
use crate::config::WriterConfig;
use crate::error::Result;
use crate::sampler::TensorSampler;
use crate::tensor::TensorInfo;
use crate::tile::TileInfo;
use crate::types::{
    AssignmentOp, BinaryOp, ConstantData, ConvertPolicy, TargetLanguage, TensorComponentType,
    TernaryOp, UnaryOp,
};

/// Body of a control-flow block. It receives the same writer back.
pub type Body<'b> = &'b mut dyn FnMut(&mut dyn KernelWriter) -> Result<()>;

/// Kernel code generation for one target language.
pub trait KernelWriter {
    fn target_language(&self) -> TargetLanguage;

    // ── ID spaces ──

    fn id_space(&self) -> i32;

    /// Switch to an already allocated ID space.
    fn set_id_space(&mut self, id: i32) -> Result<()>;

    /// Allocate a fresh ID space, switch to it and return it.
    fn next_id_space(&mut self) -> i32;

    // ── Scopes ──

    fn compound_statement_begin(&mut self);

    fn compound_statement_end(&mut self) -> Result<()>;

    // ── Declarations ──

    fn declare_tile(&mut self, name: &str, info: TileInfo) -> Result<TileOperand>;

    fn declare_constant_tile(&mut self, data: &ConstantData) -> Result<TileOperand>;

    fn declare_tensor_argument(&mut self, name: &str, info: TensorInfo) -> Result<TensorOperand>;

    /// A shape-derived scalar of `tensor` as a tile. Always a kernel parameter.
    fn tensor_component(
        &mut self,
        tensor: &TensorOperand,
        component: TensorComponentType,
    ) -> Result<TileOperand>;

    // ── Elementwise ──

    fn op_assign(&mut self, dst: &TileOperand, src: &TileOperand) -> Result<()>;

    fn op_cast(&mut self, dst: &TileOperand, src: &TileOperand, policy: ConvertPolicy) -> Result<()>;

    fn op_unary(&mut self, dst: &TileOperand, op: UnaryOp, src: &TileOperand) -> Result<()>;

    fn op_binary(
        &mut self,
        dst: &TileOperand,
        op: BinaryOp,
        lhs: &TileOperand,
        rhs: &TileOperand,
    ) -> Result<()>;

    fn op_ternary(
        &mut self,
        dst: &TileOperand,
        op: TernaryOp,
        first: &TileOperand,
        second: &TileOperand,
        third: &TileOperand,
    ) -> Result<()>;

    // ── Control flow ──

    fn op_if(&mut self, lhs: &TileOperand, op: BinaryOp, rhs: &TileOperand, body: Body<'_>) -> Result<()>;

    fn op_else_if(
        &mut self,
        lhs: &TileOperand,
        op: BinaryOp,
        rhs: &TileOperand,
        body: Body<'_>,
    ) -> Result<()>;

    fn op_else(&mut self, body: Body<'_>) -> Result<()>;

    #[allow(clippy::too_many_arguments)]
    fn op_for_loop(
        &mut self,
        var: &TileOperand,
        cond_op: BinaryOp,
        cond_value: &TileOperand,
        update_var: &TileOperand,
        update_op: AssignmentOp,
        update_value: &TileOperand,
        body: Body<'_>,
    ) -> Result<()>;

    fn op_return(&mut self);

    // ── Misc ──

    fn op_get_global_id(&mut self, dst: &TileOperand, dim: i32) -> Result<()>;

    fn op_print(&mut self, prefix: &str, operands: &[TileOperand]) -> Result<()>;

    fn op_comment(&mut self, text: &str) -> Result<()>;

    fn op_write_raw_code(&mut self, code: &str);

    // ── Memory ──

    #[allow(clippy::too_many_arguments)]
    fn op_load(
        &mut self,
        tile: &TileOperand,
        tensor: &TensorOperand,
        sampler: &TensorSampler,
        x: &TileOperand,
        y: &TileOperand,
        z: &TileOperand,
        batch: &TileOperand,
    ) -> Result<()>;

    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<()>;

    /// Load where row `i` of the tile reads from tensor row `y[i]`.
    #[allow(clippy::too_many_arguments)]
    fn op_load_indirect(
        &mut self,
        tile: &TileOperand,
        tensor: &TensorOperand,
        sampler: &TensorSampler,
        x: &TileOperand,
        y: &TileOperand,
        z: &TileOperand,
        batch: &TileOperand,
    ) -> Result<()>;

    #[allow(clippy::too_many_arguments)]
    fn op_store(
        &mut self,
        tensor: &TensorOperand,
        tile: &TileOperand,
        sampler: &TensorSampler,
        x: &TileOperand,
        y: &TileOperand,
        z: &TileOperand,
        batch: &TileOperand,
    ) -> Result<()>;

    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<()>;

    // ── Output ──

    fn emit_kernel(&mut self, name: &str) -> Result<Kernel>;

    fn body_source_code(&self) -> &str;
}

/// Create a writer for `language`.
pub fn create_kernel_writer(language: TargetLanguage, config: WriterConfig) -> Box<dyn KernelWriter> {
    match language {
        TargetLanguage::OpenCL => Box::new(CLKernelWriter::new(config)),
    }
}
