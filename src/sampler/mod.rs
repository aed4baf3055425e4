//! How a tensor is read or written: storage kind, the mapping of its
//! dimensions onto x/y/z/batch, and per-axis boundary handling.

mod mapper;

pub use mapper::Tensor3dMapper;

use std::str::FromStr;

use crate::error::ParseError;
use crate::types::TensorStorageType;

/// Mapping of the (up to 5D) tensor onto the three spatial axes.
/// Batch is always dimension 3.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TensorSamplerFormat {
    /// x = dim0, y = dim1 * dim2, z = 1.
    Dim0_Dim1xDim2_1,
    /// x = dim0, y = dim1, z = dim2.
    Dim0_Dim1_Dim2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TensorSamplerAddressModeX {
    None,
    /// Full-width access when `x > 0`, otherwise the leftover columns of
    /// the first (partial) block only.
    OverlappingMin,
}

/// Boundary handling shared by the Y and Z axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TensorSamplerAddressMode {
    None,
    Skip,
    SkipMinEdgeOnly,
    SkipMaxEdgeOnly,
    ClampToBorder,
    ClampToBorderMinEdgeOnly,
    ClampToBorderMaxEdgeOnly,
    ClampToNearest,
    ClampToMaxEdgeOnly,
    ClampToMinEdgeOnly,
}

pub type TensorSamplerAddressModeY = TensorSamplerAddressMode;
pub type TensorSamplerAddressModeZ = TensorSamplerAddressMode;

impl TensorSamplerAddressMode {
    /// Whether the access is wrapped in a bounds check.
    pub fn is_guarded(self) -> bool {
        self.checks_min_edge() || self.checks_max_edge()
    }

    pub fn checks_min_edge(self) -> bool {
        matches!(
            self,
            Self::Skip | Self::SkipMinEdgeOnly | Self::ClampToBorder | Self::ClampToBorderMinEdgeOnly
        )
    }

    pub fn checks_max_edge(self) -> bool {
        matches!(
            self,
            Self::Skip | Self::SkipMaxEdgeOnly | Self::ClampToBorder | Self::ClampToBorderMaxEdgeOnly
        )
    }

    /// Guarded modes that zero the destination when out of bounds.
    pub fn is_clamp_to_border(self) -> bool {
        matches!(
            self,
            Self::ClampToBorder | Self::ClampToBorderMinEdgeOnly | Self::ClampToBorderMaxEdgeOnly
        )
    }

    pub fn is_skip(self) -> bool {
        matches!(
            self,
            Self::Skip | Self::SkipMinEdgeOnly | Self::SkipMaxEdgeOnly
        )
    }

    /// Modes that rewrite the coordinate instead of branching.
    pub fn is_coordinate_clamp(self) -> bool {
        matches!(
            self,
            Self::ClampToNearest | Self::ClampToMaxEdgeOnly | Self::ClampToMinEdgeOnly
        )
    }
}

impl FromStr for TensorSamplerAddressMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "none" => Ok(Self::None),
            "skip" => Ok(Self::Skip),
            "skip_min_edge_only" => Ok(Self::SkipMinEdgeOnly),
            "skip_max_edge_only" => Ok(Self::SkipMaxEdgeOnly),
            "clamp_to_border" => Ok(Self::ClampToBorder),
            "clamp_to_border_min_edge_only" => Ok(Self::ClampToBorderMinEdgeOnly),
            "clamp_to_border_max_edge_only" => Ok(Self::ClampToBorderMaxEdgeOnly),
            "clamp_to_nearest" => Ok(Self::ClampToNearest),
            "clamp_to_max_edge_only" => Ok(Self::ClampToMaxEdgeOnly),
            "clamp_to_min_edge_only" => Ok(Self::ClampToMinEdgeOnly),
            _ => Err(ParseError::new("address mode", s)),
        }
    }
}

impl FromStr for TensorSamplerFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dim0_dim1xdim2_1" => Ok(Self::Dim0_Dim1xDim2_1),
            "dim0_dim1_dim2" => Ok(Self::Dim0_Dim1_Dim2),
            _ => Err(ParseError::new("sampler format", s)),
        }
    }
}

/// Complete description of how a load or store reaches a tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TensorSampler {
    storage: TensorStorageType,
    format: TensorSamplerFormat,
    address_mode_x: TensorSamplerAddressModeX,
    address_mode_y: TensorSamplerAddressModeY,
    address_mode_z: TensorSamplerAddressModeZ,
}

impl TensorSampler {
    pub fn new(
        storage: TensorStorageType,
        format: TensorSamplerFormat,
        address_mode_x: TensorSamplerAddressModeX,
        address_mode_y: TensorSamplerAddressModeY,
        address_mode_z: TensorSamplerAddressModeZ,
    ) -> Self {
        TensorSampler {
            storage,
            format,
            address_mode_x,
            address_mode_y,
            address_mode_z,
        }
    }

    pub fn storage(&self) -> TensorStorageType {
        self.storage
    }

    pub fn format(&self) -> TensorSamplerFormat {
        self.format
    }

    pub fn address_mode_x(&self) -> TensorSamplerAddressModeX {
        self.address_mode_x
    }

    pub fn address_mode_y(&self) -> TensorSamplerAddressModeY {
        self.address_mode_y
    }

    pub fn address_mode_z(&self) -> TensorSamplerAddressModeZ {
        self.address_mode_z
    }

    pub fn with_storage(mut self, storage: TensorStorageType) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_format(mut self, format: TensorSamplerFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_address_mode_x(mut self, mode: TensorSamplerAddressModeX) -> Self {
        self.address_mode_x = mode;
        self
    }

    pub fn with_address_mode_y(mut self, mode: TensorSamplerAddressModeY) -> Self {
        self.address_mode_y = mode;
        self
    }

    pub fn with_address_mode_z(mut self, mode: TensorSamplerAddressModeZ) -> Self {
        self.address_mode_z = mode;
        self
    }
}

impl Default for TensorSampler {
    fn default() -> Self {
        TensorSampler::new(
            TensorStorageType::BufferUint8Ptr,
            TensorSamplerFormat::Dim0_Dim1xDim2_1,
            TensorSamplerAddressModeX::None,
            TensorSamplerAddressMode::None,
            TensorSamplerAddressMode::None,
        )
    }
}
