//! Adapters for composing several components into one kernel.
//!
//! Each component writes through a `ScopedKernelWriter`, which gives it a
//! private ID space so its tile names cannot clash with its neighbours'.
//! Tensors shared between components are declared once through a
//! `VariableTable`; intermediate (virtual) tensors never reach the kernel
//! signature and are passed along as a tile plus a sampler instead.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::error::{KernelWriterError, Result};
use crate::sampler::TensorSampler;
use crate::tensor::TensorInfo;
use crate::writer::{KernelWriter, TensorOperand, TileOperand};

// ─── Scoped writer ────────────────────────────────────────────────

/// Writer handle that owns a fresh ID space for its lifetime.
///
/// Dropping it switches the writer back to the ID space that was active
/// when it was created.
pub struct ScopedKernelWriter<'w> {
    writer: &'w mut dyn KernelWriter,
    parent_id_space: i32,
}

impl<'w> ScopedKernelWriter<'w> {
    pub fn new(writer: &'w mut dyn KernelWriter) -> Self {
        let parent_id_space = writer.id_space();
        let id_space = writer.next_id_space();
        debug!(parent = parent_id_space, id_space, "enter component scope");
        ScopedKernelWriter {
            writer,
            parent_id_space,
        }
    }

    /// Child scope on the same writer.
    pub fn nested(&mut self) -> ScopedKernelWriter<'_> {
        ScopedKernelWriter::new(&mut *self.writer)
    }

    pub fn parent_id_space(&self) -> i32 {
        self.parent_id_space
    }
}

impl Drop for ScopedKernelWriter<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.writer.set_id_space(self.parent_id_space) {
            warn!(%err, "cannot restore parent id space");
        }
    }
}

impl<'w> Deref for ScopedKernelWriter<'w> {
    type Target = dyn KernelWriter + 'w;

    fn deref(&self) -> &Self::Target {
        &*self.writer
    }
}

impl DerefMut for ScopedKernelWriter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.writer
    }
}

// ─── Component argument ───────────────────────────────────────────

/// What one component sees of a tensor: either a real kernel argument, or
/// the tile and sampler a previous component left it in.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ComponentArgument {
    tensor: Option<TensorOperand>,
    tile: Option<TileOperand>,
    sampler: Option<TensorSampler>,
}

impl ComponentArgument {
    pub fn from_tensor(tensor: TensorOperand) -> Self {
        ComponentArgument {
            tensor: Some(tensor),
            ..Self::default()
        }
    }

    /// Bind the tile holding this tensor's values and the sampler they were
    /// computed with.
    pub fn init_virtual_tensor(&mut self, tile: TileOperand, sampler: TensorSampler) -> Result<()> {
        if self.tile.is_some() {
            return Err(KernelWriterError::Precondition(
                "component argument already holds a tile".to_string(),
            ));
        }
        self.tile = Some(tile);
        self.sampler = Some(sampler);
        Ok(())
    }

    pub fn has_tensor(&self) -> bool {
        self.tensor.is_some()
    }

    pub fn tensor(&self) -> Result<TensorOperand> {
        self.tensor.ok_or_else(|| {
            KernelWriterError::Precondition("component argument has no tensor".to_string())
        })
    }

    pub fn has_tile(&self) -> bool {
        self.tile.is_some()
    }

    pub fn tile(&self) -> Result<TileOperand> {
        self.tile.ok_or_else(|| {
            KernelWriterError::Precondition("component argument has no tile".to_string())
        })
    }

    pub fn tile_sampler(&self) -> Result<TensorSampler> {
        self.sampler.ok_or_else(|| {
            KernelWriterError::Precondition("component argument has no tile sampler".to_string())
        })
    }
}

// ─── Variable table ───────────────────────────────────────────────

/// Tensor id to component argument, shared by every component of a kernel.
#[derive(Clone, Debug, Default)]
pub struct VariableTable {
    vars: HashMap<i32, ComponentArgument>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The argument for `info.id()`, declaring it on first use.
    ///
    /// User tensors become kernel arguments named `{alias}_t{|id|}`.
    /// Virtual tensors get an empty argument to be filled with a tile.
    pub fn declare_variable(
        &mut self,
        writer: &mut dyn KernelWriter,
        info: TensorInfo,
        alias: &str,
    ) -> Result<&mut ComponentArgument> {
        match self.vars.entry(info.id()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let argument = if info.is_virtual() {
                    ComponentArgument::default()
                } else {
                    let name = format!("{}_t{}", alias, info.id().unsigned_abs());
                    ComponentArgument::from_tensor(writer.declare_tensor_argument(&name, info)?)
                };
                Ok(entry.insert(argument))
            }
        }
    }

    pub fn get(&self, id: i32) -> Option<&ComponentArgument> {
        self.vars.get(&id)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests;
