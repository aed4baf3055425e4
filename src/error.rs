//! Error types for kernel generation.
//!
//! Every writer operation is fallible. A returned error means the caller
//! issued a malformed call sequence; the partially written body is left as
//! is and the writer should be abandoned.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KernelWriterError>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KernelWriterError {
    #[error("there is already a tile with name '{0}'")]
    DuplicateTile(String),
    #[error("there is already a tensor argument with name '{0}'")]
    DuplicateTensor(String),
    #[error("tensor id {0} is already bound to another tensor argument")]
    DuplicateTensorId(i32),
    #[error("tensor '{name}' has virtual id {id} and cannot be a kernel argument")]
    VirtualTensor { name: String, id: i32 },
    #[error("tile operand does not refer to a live tile (out of scope or foreign writer)")]
    TileNotFound,
    #[error("tensor operand does not refer to a tensor of this writer")]
    TensorNotFound,
    #[error("unsupported vector width {0}")]
    UnsupportedVectorWidth(i32),
    #[error("invalid tile shape {height}x{width}")]
    InvalidTileShape { height: i32, width: i32 },
    #[error("invalid tile area rows {row_start}..{row_end}, cols {col_start}..{col_end}")]
    InvalidTileArea {
        row_start: i32,
        row_end: i32,
        col_start: i32,
        col_end: i32,
    },
    #[error("tile '{0}' is not assignable")]
    NotAssignable(String),
    #[error("precondition violated: {0}")]
    Precondition(String),
    #[error("unsupported {what}: {value}")]
    Unsupported { what: &'static str, value: String },
    #[error("unbalanced compound statement: {0}")]
    UnbalancedScope(&'static str),
    #[error("else branch without a preceding if")]
    ElseWithoutIf,
    #[error("'{0}' is not a valid kernel name")]
    InvalidKernelName(String),
}

impl KernelWriterError {
    pub(crate) fn unsupported(what: &'static str, value: impl std::fmt::Debug) -> Self {
        KernelWriterError::Unsupported {
            what,
            value: format!("{:?}", value),
        }
    }
}

/// Failure to parse one of the enum vocabularies from text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        ParseError {
            kind,
            value: value.to_string(),
        }
    }
}

/// Return `KernelWriterError::Precondition` unless `cond` holds.
macro_rules! precondition {
    ($cond:expr, $($msg:tt)+) => {
        if !$cond {
            return Err($crate::error::KernelWriterError::Precondition(format!($($msg)+)));
        }
    };
}

pub(crate) use precondition;
