//! Compute kernel writer: typed tile and tensor operations lowered to
//! OpenCL C kernel source.
//!
//! A [`KernelWriter`] hands out operands for tiles (small register grids)
//! and tensor arguments, and appends one statement per operation. Loads and
//! stores go through a [`TensorSampler`] that decides addressing and
//! boundary handling. [`KernelWriter::emit_kernel`] returns the finished
//! source together with the argument list the host has to bind.

pub mod cl;
pub mod component;
pub mod config;
pub mod error;
pub mod sampler;
pub mod tensor;
pub mod tile;
pub mod types;
pub mod writer;

pub use component::{ComponentArgument, ScopedKernelWriter, VariableTable};
pub use config::{ConfigError, WriterConfig};
pub use error::{KernelWriterError, ParseError, Result};
pub use sampler::{
    TensorSampler, TensorSamplerAddressMode, TensorSamplerAddressModeX, TensorSamplerFormat,
};
pub use tensor::{TensorInfo, TensorShape, DYNAMIC_DIM};
pub use tile::TileInfo;
pub use types::{
    AssignmentOp, BinaryOp, ConstantData, ConvertPolicy, DataType, TargetLanguage,
    TensorComponentType, TensorDataLayout, TensorStorageType, TernaryOp, UnaryOp,
};
pub use writer::{
    create_kernel_writer, Kernel, KernelArgument, KernelWriter, TensorOperand, TileOperand,
};
