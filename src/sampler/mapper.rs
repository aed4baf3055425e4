use super::TensorSamplerFormat;
use crate::error::Result;
use crate::tensor::TensorArgument;
use crate::tile::TileVariable;
use crate::types::{DataType, TensorComponentType};

/// Reduces a tensor of any rank to x/y/z/batch addressing for one format.
///
/// Accessors that return a component materialize it on the tensor. The
/// `is_one_*` predicates only inspect the static shape and never create
/// a parameter.
pub struct Tensor3dMapper<'a> {
    tensor: &'a mut dyn TensorArgument,
    format: TensorSamplerFormat,
}

fn literal(value: &str) -> TileVariable {
    TileVariable::new(value, DataType::Int32, 1)
}

impl<'a> Tensor3dMapper<'a> {
    pub fn new(tensor: &'a mut dyn TensorArgument, format: TensorSamplerFormat) -> Self {
        Tensor3dMapper { tensor, format }
    }

    pub fn format(&self) -> TensorSamplerFormat {
        self.format
    }

    pub fn tensor(&mut self) -> &mut (dyn TensorArgument + 'a) {
        &mut *self.tensor
    }

    pub fn tensor_ref(&self) -> &(dyn TensorArgument + 'a) {
        &*self.tensor
    }

    pub fn dim_x(&mut self) -> Result<TileVariable> {
        self.tensor.component(TensorComponentType::Dim0)
    }

    pub fn dim_y(&mut self) -> Result<TileVariable> {
        match self.format {
            TensorSamplerFormat::Dim0_Dim1xDim2_1 => {
                self.tensor.component(TensorComponentType::Dim1xDim2)
            }
            TensorSamplerFormat::Dim0_Dim1_Dim2 => self.tensor.component(TensorComponentType::Dim1),
        }
    }

    pub fn dim_z(&mut self) -> Result<TileVariable> {
        match self.format {
            TensorSamplerFormat::Dim0_Dim1xDim2_1 => Ok(literal("1")),
            TensorSamplerFormat::Dim0_Dim1_Dim2 => self.tensor.component(TensorComponentType::Dim2),
        }
    }

    pub fn dim_batch(&mut self) -> Result<TileVariable> {
        self.tensor.component(TensorComponentType::Dim3)
    }

    pub fn stride_x(&mut self) -> Result<TileVariable> {
        self.tensor.component(TensorComponentType::Stride0)
    }

    pub fn stride_y(&mut self) -> Result<TileVariable> {
        self.tensor.component(TensorComponentType::Stride1)
    }

    pub fn stride_z(&mut self) -> Result<TileVariable> {
        match self.format {
            TensorSamplerFormat::Dim0_Dim1xDim2_1 => Ok(literal("0")),
            TensorSamplerFormat::Dim0_Dim1_Dim2 => {
                self.tensor.component(TensorComponentType::Stride2)
            }
        }
    }

    pub fn stride_batch(&mut self) -> Result<TileVariable> {
        self.tensor.component(TensorComponentType::Stride3)
    }

    /// `None` when any dim is dynamic or the product overflows.
    fn static_product(&self, dims: &[usize]) -> Option<i32> {
        let info = self.tensor.info();
        dims.iter()
            .try_fold(1i32, |acc, &dim| acc.checked_mul(info.static_dim(dim)?))
    }

    pub fn is_one_x(&self) -> bool {
        self.static_product(&[0]) == Some(1)
    }

    pub fn is_one_z(&self) -> bool {
        match self.format {
            TensorSamplerFormat::Dim0_Dim1xDim2_1 => true,
            TensorSamplerFormat::Dim0_Dim1_Dim2 => self.static_product(&[2]) == Some(1),
        }
    }

    pub fn is_one_batch(&self) -> bool {
        self.static_product(&[3]) == Some(1)
    }
}
