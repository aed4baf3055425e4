use serde::{Deserialize, Serialize};

use crate::types::{TargetLanguage, TensorComponentType, TensorStorageType};

/// One kernel parameter, in the order it appears in the signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KernelArgument {
    /// Data pointer or image of tensor `id`.
    TensorStorage { id: i32, storage: TensorStorageType },
    /// Shape-derived scalar of tensor `id`.
    TensorComponent {
        id: i32,
        component: TensorComponentType,
    },
}

impl KernelArgument {
    pub fn id(&self) -> i32 {
        match self {
            KernelArgument::TensorStorage { id, .. } | KernelArgument::TensorComponent { id, .. } => *id,
        }
    }
}

/// A complete kernel: source text plus the argument list the host must bind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kernel {
    target: TargetLanguage,
    arguments: Vec<KernelArgument>,
    source_code: String,
}

impl Kernel {
    pub fn new(target: TargetLanguage, arguments: Vec<KernelArgument>, source_code: String) -> Self {
        Kernel {
            target,
            arguments,
            source_code,
        }
    }

    pub fn target(&self) -> TargetLanguage {
        self.target
    }

    pub fn arguments(&self) -> &[KernelArgument] {
        &self.arguments
    }

    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    /// BLAKE3 of the source text, hex encoded. Stable key for a program cache.
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.source_code.as_bytes()).to_hex().to_string()
    }
}
