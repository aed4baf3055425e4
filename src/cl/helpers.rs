//! OpenCL spelling of types and operators, plus small text utilities
//! shared by the tile model and the memory helpers.

use crate::error::{KernelWriterError, Result};
use crate::types::{AssignmentOp, BinaryOp, DataType, TensorStorageType, TernaryOp, UnaryOp};

/// Vector lengths OpenCL C accepts for `typeN`, in ascending order.
pub const SUPPORTED_VECTOR_WIDTHS: [i32; 6] = [1, 2, 3, 4, 8, 16];

pub fn is_supported_vector_width(width: i32) -> bool {
    SUPPORTED_VECTOR_WIDTHS.contains(&width)
}

pub fn validate_vector_width(width: i32) -> Result<()> {
    if is_supported_vector_width(width) {
        Ok(())
    } else {
        Err(KernelWriterError::UnsupportedVectorWidth(width))
    }
}

/// Split `width` into the shortest ordered run of supported widths,
/// largest first. 13 becomes [8, 4, 1]; 0 becomes [].
pub fn decompose_vector_width(width: i32) -> Vec<i32> {
    let mut parts = Vec::new();
    let mut left = width.max(0);
    for &w in SUPPORTED_VECTOR_WIDTHS.iter().rev() {
        while left >= w {
            parts.push(w);
            left -= w;
        }
    }
    parts
}

pub fn cl_scalar_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Fp32 => "float",
        DataType::Fp16 => "half",
        DataType::Int32 => "int",
        DataType::Uint32 => "uint",
        DataType::Int16 => "short",
        DataType::Uint16 => "ushort",
        DataType::Int8 => "char",
        DataType::Uint8 => "uchar",
        DataType::Bool => "bool",
    }
}

/// `float`, `float4`, `uchar16`, ...
pub fn cl_data_type(data_type: DataType, width: i32) -> String {
    let base = cl_scalar_type(data_type);
    if width == 1 {
        base.to_string()
    } else {
        format!("{}{}", base, width)
    }
}

pub fn cl_storage_type(storage: TensorStorageType) -> &'static str {
    match storage {
        TensorStorageType::BufferUint8Ptr => "__global uchar*",
        TensorStorageType::Texture2dReadOnly => "__read_only image2d_t",
        TensorStorageType::Texture2dWriteOnly => "__write_only image2d_t",
    }
}

/// `(is_function, spelling)` of a unary operator.
pub fn cl_unary_op(op: UnaryOp) -> (bool, &'static str) {
    match op {
        UnaryOp::LogicalNot => (false, "!"),
        UnaryOp::BitwiseNot => (false, "~"),
        UnaryOp::Exp => (true, "exp"),
        UnaryOp::Tanh => (true, "tanh"),
        UnaryOp::Sqrt => (true, "sqrt"),
        UnaryOp::Erf => (true, "erf"),
        UnaryOp::Fabs => (true, "fabs"),
        UnaryOp::Log => (true, "log"),
        UnaryOp::Round => (true, "round"),
    }
}

/// `(is_function, spelling)` of an elementwise binary operator.
/// `MatMulNtT` has no single spelling and is rejected.
pub fn cl_binary_op(op: BinaryOp, data_type: DataType) -> Result<(bool, &'static str)> {
    let float = data_type.is_float();
    Ok(match op {
        BinaryOp::Add => (false, "+"),
        BinaryOp::Sub => (false, "-"),
        BinaryOp::Mul => (false, "*"),
        BinaryOp::Div => (false, "/"),
        BinaryOp::Mod => (false, "%"),
        BinaryOp::Equal => (false, "=="),
        BinaryOp::Less => (false, "<"),
        BinaryOp::LessEqual => (false, "<="),
        BinaryOp::Greater => (false, ">"),
        BinaryOp::GreaterEqual => (false, ">="),
        BinaryOp::LogicalAnd => (false, "&&"),
        BinaryOp::LogicalOr => (false, "||"),
        BinaryOp::BitwiseXor => (false, "^"),
        BinaryOp::Min => (true, if float { "fmin" } else { "min" }),
        BinaryOp::Max => (true, if float { "fmax" } else { "max" }),
        BinaryOp::MatMulNtT => {
            return Err(KernelWriterError::unsupported("elementwise binary op", op))
        }
    })
}

pub fn cl_ternary_op(op: TernaryOp) -> (bool, &'static str) {
    match op {
        TernaryOp::Select => (true, "select"),
        TernaryOp::Clamp => (true, "clamp"),
    }
}

pub fn cl_assignment_op(op: AssignmentOp) -> &'static str {
    match op {
        AssignmentOp::Increment => "+=",
        AssignmentOp::Decrement => "-=",
    }
}

/// Lane selector digit used in `.sXYZ` swizzles.
pub fn lane_digit(lane: i32) -> char {
    std::char::from_digit(lane.clamp(0, 15) as u32, 16).unwrap_or('0')
}

/// Whether a coordinate expression is a literal zero, either bare or as
/// rendered by a constant tile.
pub fn is_zero_literal(expr: &str) -> bool {
    matches!(expr, "0" | "((int)(0))" | "((uint)(0))")
}

/// Whether an expression is the literal one, bare or rendered by a constant tile.
pub fn is_one_literal(expr: &str) -> bool {
    matches!(expr, "1" | "((int)(1))" | "((uint)(1))")
}

/// Whether `name` is usable as a C identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
