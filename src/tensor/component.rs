use crate::cl::helpers::cl_storage_type;
use crate::error::Result;
use crate::tile::{CLTile, ScalarTile, TileInfo, TileVariable};
use crate::types::{DataType, TensorComponentType, TensorStorageType};

/// A materialized tensor component: a scalar `int` kernel parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorComponent {
    component_type: TensorComponentType,
    tile: CLTile,
}

impl TensorComponent {
    pub(crate) fn new(tensor_name: &str, component_type: TensorComponentType) -> Result<Self> {
        let name = format!("{}_{}", tensor_name, component_type.suffix());
        let tile = CLTile::new(name, TileInfo::scalar(DataType::Int32))?;
        Ok(TensorComponent {
            component_type,
            tile,
        })
    }

    pub fn component_type(&self) -> TensorComponentType {
        self.component_type
    }

    pub fn tile(&self) -> &CLTile {
        &self.tile
    }

    pub fn variable(&self) -> TileVariable {
        self.tile.scalar(0, 0)
    }
}

/// A memory object bound as a kernel parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorStorageVariable {
    pub val: String,
    pub storage_type: TensorStorageType,
}

impl TensorStorageVariable {
    pub(crate) fn new(tensor_name: &str, storage_type: TensorStorageType) -> Self {
        let suffix = match storage_type {
            TensorStorageType::BufferUint8Ptr => "ptr",
            TensorStorageType::Texture2dReadOnly | TensorStorageType::Texture2dWriteOnly => {
                "img2d"
            }
        };
        TensorStorageVariable {
            val: format!("{}_{}", tensor_name, suffix),
            storage_type,
        }
    }

    /// OpenCL parameter type, e.g. `__global uchar*`.
    pub fn cl_type(&self) -> &'static str {
        cl_storage_type(self.storage_type)
    }
}
