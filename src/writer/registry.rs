//! Scoped tile arena.
//!
//! Tiles live in a flat arena in declaration order. Opening a compound
//! statement records the arena length; closing it truncates back, dropping
//! every tile declared inside. Each entry carries a serial so an operand that
//! outlived its tile cannot alias a later tile reusing the same slot.

use crate::error::{KernelWriterError, Result};
use crate::tile::{CLTile, ScalarTile};

#[derive(Clone, Debug)]
pub(crate) struct TileEntry {
    pub tile: CLTile,
    pub id_space: i32,
    pub name: String,
    pub serial: u64,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TileRegistry {
    entries: Vec<TileEntry>,
    scopes: Vec<usize>,
    next_serial: u64,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tile under (id_space, name) and return its (slot, serial).
    pub fn declare(&mut self, id_space: i32, name: &str, tile: CLTile) -> Result<(usize, u64)> {
        if self.lookup(id_space, name).is_some() {
            return Err(KernelWriterError::DuplicateTile(tile.name().to_string()));
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        self.entries.push(TileEntry {
            tile,
            id_space,
            name: name.to_string(),
            serial,
        });
        Ok((self.entries.len() - 1, serial))
    }

    pub fn lookup(&self, id_space: i32, name: &str) -> Option<&TileEntry> {
        self.entries
            .iter()
            .find(|e| e.id_space == id_space && e.name == name)
    }

    pub fn get(&self, slot: usize, serial: u64) -> Result<&CLTile> {
        match self.entries.get(slot) {
            Some(entry) if entry.serial == serial => Ok(&entry.tile),
            _ => Err(KernelWriterError::TileNotFound),
        }
    }

    pub fn begin_scope(&mut self) {
        self.scopes.push(self.entries.len());
    }

    /// Close the innermost scope and return how many tiles it dropped.
    pub fn end_scope(&mut self) -> Result<usize> {
        let mark = self
            .scopes
            .pop()
            .ok_or(KernelWriterError::UnbalancedScope(
                "compound statement end without a matching begin",
            ))?;
        let dropped = self.entries.len() - mark;
        self.entries.truncate(mark);
        Ok(dropped)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
