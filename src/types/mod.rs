//! Scalar vocabulary shared by tiles, tensors and the writer.
//!
//! Everything here is plain data: data types, operator enums, storage
//! kinds and the tensor component enumeration. Classification of tensor
//! components is done with explicit functions instead of bit tricks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{KernelWriterError, ParseError, Result};

// ─── Data types ───────────────────────────────────────────────────

/// Scalar element type of a tile or tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Fp32,
    Fp16,
    Int32,
    Uint32,
    Int16,
    Uint16,
    Int8,
    Uint8,
    Bool,
}

impl DataType {
    pub fn is_float(self) -> bool {
        matches!(self, DataType::Fp32 | DataType::Fp16)
    }

    pub fn is_signed_int(self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int16 | DataType::Int8)
    }

    pub fn is_unsigned_int(self) -> bool {
        matches!(self, DataType::Uint32 | DataType::Uint16 | DataType::Uint8)
    }

    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            DataType::Fp32 | DataType::Int32 | DataType::Uint32 => 4,
            DataType::Fp16 | DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int8 | DataType::Uint8 | DataType::Bool => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Fp32 => "fp32",
            DataType::Fp16 => "fp16",
            DataType::Int32 => "int32",
            DataType::Uint32 => "uint32",
            DataType::Int16 => "int16",
            DataType::Uint16 => "uint16",
            DataType::Int8 => "int8",
            DataType::Uint8 => "uint8",
            DataType::Bool => "bool",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "fp32" | "f32" | "float" => Ok(DataType::Fp32),
            "fp16" | "f16" | "half" => Ok(DataType::Fp16),
            "int32" | "i32" => Ok(DataType::Int32),
            "uint32" | "u32" => Ok(DataType::Uint32),
            "int16" | "i16" => Ok(DataType::Int16),
            "uint16" | "u16" => Ok(DataType::Uint16),
            "int8" | "i8" => Ok(DataType::Int8),
            "uint8" | "u8" => Ok(DataType::Uint8),
            "bool" => Ok(DataType::Bool),
            _ => Err(ParseError::new("data type", s)),
        }
    }
}

/// Output dialect of a kernel writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetLanguage {
    #[serde(rename = "opencl")]
    OpenCL,
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetLanguage::OpenCL => f.write_str("opencl"),
        }
    }
}

impl FromStr for TargetLanguage {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "opencl" | "cl" => Ok(TargetLanguage::OpenCL),
            _ => Err(ParseError::new("target language", s)),
        }
    }
}

// ─── Tensor vocabulary ────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorDataLayout {
    Nhwc,
    Ndhwc,
}

/// How a tensor is bound to the kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorStorageType {
    BufferUint8Ptr,
    Texture2dReadOnly,
    Texture2dWriteOnly,
}

impl TensorStorageType {
    pub fn is_image2d(self) -> bool {
        !matches!(self, TensorStorageType::BufferUint8Ptr)
    }
}

impl FromStr for TensorStorageType {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "buffer" | "buffer_uint8_ptr" => Ok(TensorStorageType::BufferUint8Ptr),
            "image2d_ro" | "texture2d_read_only" => Ok(TensorStorageType::Texture2dReadOnly),
            "image2d_wo" | "texture2d_write_only" => Ok(TensorStorageType::Texture2dWriteOnly),
            _ => Err(ParseError::new("tensor storage", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemoryOperation {
    Load,
    Store,
}

/// Shape-derived scalar of a tensor that may become a kernel parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorComponentType {
    OffsetFirstElement,
    Stride0,
    Stride1,
    Stride2,
    Stride3,
    Stride4,
    Dim0,
    Dim1,
    Dim2,
    Dim3,
    Dim4,
    Dim1xDim2,
    Dim1xDim2xDim3,
    Dim2xDim3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TensorComponentGroup {
    OffsetFirstElement,
    Stride,
    Dimension,
    FoldedDimensions,
}

impl TensorComponentType {
    pub const ALL: [TensorComponentType; 14] = [
        TensorComponentType::OffsetFirstElement,
        TensorComponentType::Stride0,
        TensorComponentType::Stride1,
        TensorComponentType::Stride2,
        TensorComponentType::Stride3,
        TensorComponentType::Stride4,
        TensorComponentType::Dim0,
        TensorComponentType::Dim1,
        TensorComponentType::Dim2,
        TensorComponentType::Dim3,
        TensorComponentType::Dim4,
        TensorComponentType::Dim1xDim2,
        TensorComponentType::Dim1xDim2xDim3,
        TensorComponentType::Dim2xDim3,
    ];

    pub fn group(self) -> TensorComponentGroup {
        use TensorComponentType::*;
        match self {
            OffsetFirstElement => TensorComponentGroup::OffsetFirstElement,
            Stride0 | Stride1 | Stride2 | Stride3 | Stride4 => TensorComponentGroup::Stride,
            Dim0 | Dim1 | Dim2 | Dim3 | Dim4 => TensorComponentGroup::Dimension,
            Dim1xDim2 | Dim1xDim2xDim3 | Dim2xDim3 => TensorComponentGroup::FoldedDimensions,
        }
    }

    pub fn is_dimension(self) -> bool {
        self.group() == TensorComponentGroup::Dimension
    }

    pub fn is_stride(self) -> bool {
        self.group() == TensorComponentGroup::Stride
    }

    pub fn is_folded_dimension(self) -> bool {
        self.group() == TensorComponentGroup::FoldedDimensions
    }

    pub fn is_offset_first_element(self) -> bool {
        self.group() == TensorComponentGroup::OffsetFirstElement
    }

    /// Shape indices whose product gives the value of a dimension or
    /// folded-dimension component. Empty for strides and the offset.
    pub fn contributing_dims(self) -> &'static [usize] {
        use TensorComponentType::*;
        match self {
            Dim0 => &[0],
            Dim1 => &[1],
            Dim2 => &[2],
            Dim3 => &[3],
            Dim4 => &[4],
            Dim1xDim2 => &[1, 2],
            Dim1xDim2xDim3 => &[1, 2, 3],
            Dim2xDim3 => &[2, 3],
            OffsetFirstElement | Stride0 | Stride1 | Stride2 | Stride3 | Stride4 => &[],
        }
    }

    /// Suffix appended to the tensor name to form the parameter name.
    pub fn suffix(self) -> &'static str {
        use TensorComponentType::*;
        match self {
            OffsetFirstElement => "offset_first_element",
            Stride0 => "stride0",
            Stride1 => "stride1",
            Stride2 => "stride2",
            Stride3 => "stride3",
            Stride4 => "stride4",
            Dim0 => "dim0",
            Dim1 => "dim1",
            Dim2 => "dim2",
            Dim3 => "dim3",
            Dim4 => "dim4",
            Dim1xDim2 => "dim1xdim2",
            Dim1xDim2xDim3 => "dim1xdim2xdim3",
            Dim2xDim3 => "dim2xdim3",
        }
    }
}

impl fmt::Display for TensorComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

// ─── Operators ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConvertPolicy {
    None,
    Saturate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    LogicalNot,
    BitwiseNot,
    Exp,
    Tanh,
    Sqrt,
    Erf,
    Fabs,
    Log,
    Round,
}

impl FromStr for UnaryOp {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "not" | "!" => Ok(UnaryOp::LogicalNot),
            "bitnot" | "~" => Ok(UnaryOp::BitwiseNot),
            "exp" => Ok(UnaryOp::Exp),
            "tanh" => Ok(UnaryOp::Tanh),
            "sqrt" => Ok(UnaryOp::Sqrt),
            "erf" => Ok(UnaryOp::Erf),
            "fabs" | "abs" => Ok(UnaryOp::Fabs),
            "log" => Ok(UnaryOp::Log),
            "round" => Ok(UnaryOp::Round),
            _ => Err(ParseError::new("unary op", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // ── Arithmetic ──
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // ── Relational ──
    Equal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    // ── Logical ──
    LogicalAnd,
    LogicalOr,
    BitwiseXor,
    // ── Functions ──
    Min,
    Max,
    /// `dst += lhs * transpose(rhs)`, lowered to an fma chain.
    MatMulNtT,
}

impl BinaryOp {
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }
}

impl FromStr for BinaryOp {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "add" | "+" => Ok(BinaryOp::Add),
            "sub" | "-" => Ok(BinaryOp::Sub),
            "mul" | "*" => Ok(BinaryOp::Mul),
            "div" | "/" => Ok(BinaryOp::Div),
            "mod" | "%" => Ok(BinaryOp::Mod),
            "eq" | "==" => Ok(BinaryOp::Equal),
            "lt" | "<" => Ok(BinaryOp::Less),
            "le" | "<=" => Ok(BinaryOp::LessEqual),
            "gt" | ">" => Ok(BinaryOp::Greater),
            "ge" | ">=" => Ok(BinaryOp::GreaterEqual),
            "and" | "&&" => Ok(BinaryOp::LogicalAnd),
            "or" | "||" => Ok(BinaryOp::LogicalOr),
            "xor" | "^" => Ok(BinaryOp::BitwiseXor),
            "min" => Ok(BinaryOp::Min),
            "max" => Ok(BinaryOp::Max),
            "matmul_nt_t" => Ok(BinaryOp::MatMulNtT),
            _ => Err(ParseError::new("binary op", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TernaryOp {
    Select,
    Clamp,
}

/// Update operator of a `for` loop header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssignmentOp {
    Increment,
    Decrement,
}

// ─── Constant data ────────────────────────────────────────────────

/// Scalar value that can populate a constant tile.
pub trait ConstantValue: Copy {
    /// Whether values of this Rust type may back a tile of `data_type`.
    fn accepts(data_type: DataType) -> bool;
    fn to_literal(self) -> String;
}

impl ConstantValue for i32 {
    fn accepts(data_type: DataType) -> bool {
        data_type.is_signed_int()
    }

    fn to_literal(self) -> String {
        self.to_string()
    }
}

impl ConstantValue for u32 {
    fn accepts(data_type: DataType) -> bool {
        data_type.is_unsigned_int()
    }

    fn to_literal(self) -> String {
        self.to_string()
    }
}

impl ConstantValue for f32 {
    fn accepts(data_type: DataType) -> bool {
        data_type.is_float()
    }

    fn to_literal(self) -> String {
        if self.is_nan() {
            "NAN".to_string()
        } else if self.is_infinite() {
            let lit = if self > 0.0 { "INFINITY" } else { "-INFINITY" };
            lit.to_string()
        } else {
            format!("{:?}f", self)
        }
    }
}

impl ConstantValue for bool {
    fn accepts(data_type: DataType) -> bool {
        data_type == DataType::Bool
    }

    fn to_literal(self) -> String {
        let lit = if self { "true" } else { "false" };
        lit.to_string()
    }
}

/// Rectangular block of literal values, stored as rendered strings.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantData {
    values: Vec<Vec<String>>,
    data_type: DataType,
}

impl ConstantData {
    pub fn new<T: ConstantValue>(rows: &[Vec<T>], data_type: DataType) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.is_empty() || width == 0 {
            return Err(KernelWriterError::InvalidTileShape {
                height: rows.len() as i32,
                width: width as i32,
            });
        }
        if rows.iter().any(|row| row.len() != width) {
            return Err(KernelWriterError::Precondition(
                "all rows of constant data must have the same width".to_string(),
            ));
        }
        if !T::accepts(data_type) {
            return Err(KernelWriterError::unsupported(
                "constant data type",
                data_type,
            ));
        }
        let values = rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_literal()).collect())
            .collect();
        Ok(ConstantData { values, data_type })
    }

    /// A 1x1 block.
    pub fn scalar<T: ConstantValue>(value: T, data_type: DataType) -> Result<Self> {
        Self::new(&[vec![value]], data_type)
    }

    pub fn values(&self) -> &[Vec<String>] {
        &self.values
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}
