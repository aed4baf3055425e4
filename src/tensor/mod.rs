//! Tensor arguments and their on-demand kernel parameters.
//!
//! A tensor is a 5D shape (`-1` marks a dimension unknown until run time)
//! plus a data type, layout and id. Code that addresses the tensor asks
//! for components (dims, strides, offset) and storages (buffer pointer,
//! image). Each is created the first time it is asked for and remembered,
//! so the kernel parameter list is exactly what the body references.

mod component;

pub use component::{TensorComponent, TensorStorageVariable};

use tracing::trace;

use crate::error::Result;
use crate::tile::TileVariable;
use crate::types::{DataType, TensorComponentType, TensorDataLayout, TensorStorageType};

/// Marks a dimension whose size is only known at run time.
pub const DYNAMIC_DIM: i32 = -1;

pub type TensorShape = [i32; 5];

/// Description of a tensor as seen by the kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TensorInfo {
    data_type: DataType,
    shape: TensorShape,
    layout: TensorDataLayout,
    id: i32,
}

impl TensorInfo {
    pub fn new(data_type: DataType, shape: TensorShape, layout: TensorDataLayout, id: i32) -> Self {
        TensorInfo {
            data_type,
            shape,
            layout,
            id,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    pub fn layout(&self) -> TensorDataLayout {
        self.layout
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    /// Intermediate tensors have a negative id and never become arguments.
    pub fn is_virtual(&self) -> bool {
        self.id < 0
    }

    pub fn is_dynamic(&self, dim: usize) -> bool {
        self.shape[dim] == DYNAMIC_DIM
    }

    /// Every dim is positive or [`DYNAMIC_DIM`].
    pub fn has_valid_shape(&self) -> bool {
        self.shape.iter().all(|&d| d == DYNAMIC_DIM || d >= 1)
    }

    /// Static value of a dimension, `None` if dynamic.
    pub fn static_dim(&self, dim: usize) -> Option<i32> {
        let value = self.shape[dim];
        (value != DYNAMIC_DIM).then_some(value)
    }
}

/// Access to the kernel-parameter view of a tensor.
pub trait TensorArgument {
    fn name(&self) -> &str;

    fn info(&self) -> &TensorInfo;

    /// Value of a component: a literal when it folds, otherwise the name
    /// of a (possibly new) kernel parameter.
    fn component(&mut self, component_type: TensorComponentType) -> Result<TileVariable>;

    fn storage(&mut self, storage_type: TensorStorageType) -> TensorStorageVariable;

    /// Storages used so far, in the order they were first requested.
    fn storages(&self) -> &[TensorStorageVariable];

    /// Components materialized so far, in the order they were first requested.
    fn components(&self) -> &[TensorComponent];
}

#[derive(Clone, Debug)]
pub struct CLTensorArgument {
    name: String,
    info: TensorInfo,
    return_dims_by_value: bool,
    components: Vec<TensorComponent>,
    storages: Vec<TensorStorageVariable>,
}

impl CLTensorArgument {
    pub fn new(name: impl Into<String>, info: TensorInfo, return_dims_by_value: bool) -> Self {
        CLTensorArgument {
            name: name.into(),
            info,
            return_dims_by_value,
            components: Vec::new(),
            storages: Vec::new(),
        }
    }

    /// The component as a kernel parameter, created if needed. Never folds.
    pub fn cl_component(&mut self, component_type: TensorComponentType) -> Result<&TensorComponent> {
        let found = self
            .components
            .iter()
            .position(|c| c.component_type() == component_type);
        let index = match found {
            Some(index) => index,
            None => {
                let component = TensorComponent::new(&self.name, component_type)?;
                trace!(tensor = %self.name, component = %component_type, "materialize component");
                self.components.push(component);
                self.components.len() - 1
            }
        };
        Ok(&self.components[index])
    }

    /// An already materialized component.
    pub fn find_component(&self, component_type: TensorComponentType) -> Option<&TensorComponent> {
        self.components
            .iter()
            .find(|c| c.component_type() == component_type)
    }

    /// Product of the contributing dimensions, if folding applies and the
    /// product fits in an `int`.
    fn folded_value(&self, component_type: TensorComponentType) -> Option<i32> {
        if !self.return_dims_by_value {
            return None;
        }
        if !(component_type.is_dimension() || component_type.is_folded_dimension()) {
            return None;
        }
        component_type
            .contributing_dims()
            .iter()
            .try_fold(1i32, |acc, &dim| acc.checked_mul(self.info.static_dim(dim)?))
    }
}

impl TensorArgument for CLTensorArgument {
    fn name(&self) -> &str {
        &self.name
    }

    fn info(&self) -> &TensorInfo {
        &self.info
    }

    fn component(&mut self, component_type: TensorComponentType) -> Result<TileVariable> {
        if let Some(existing) = self.find_component(component_type) {
            return Ok(existing.variable());
        }
        if let Some(value) = self.folded_value(component_type) {
            return Ok(TileVariable::new(value.to_string(), DataType::Int32, 1));
        }
        Ok(self.cl_component(component_type)?.variable())
    }

    fn storage(&mut self, storage_type: TensorStorageType) -> TensorStorageVariable {
        if let Some(existing) = self
            .storages
            .iter()
            .find(|s| s.storage_type == storage_type)
        {
            return existing.clone();
        }
        let storage = TensorStorageVariable::new(&self.name, storage_type);
        trace!(tensor = %self.name, storage = %storage.val, "materialize storage");
        self.storages.push(storage.clone());
        storage
    }

    fn storages(&self) -> &[TensorStorageVariable] {
        &self.storages
    }

    fn components(&self) -> &[TensorComponent] {
        &self.components
    }
}
