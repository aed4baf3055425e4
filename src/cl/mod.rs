//! OpenCL C backend.

pub mod helpers;
mod kernel_writer;
pub mod memory;

pub use kernel_writer::CLKernelWriter;
