//! Texture slot table
//!
//! Maps the textures used by the current batch to sampler slots. Once a
//! texture has a slot it keeps it until the table is reset at the next batch.

use std::rc::Rc;

use super::batch::{BatchError, BatchResult};
use crate::render::resources::Texture2D;
use crate::render::RenderResult;

/// Sampler slots available to one batch
pub const MAX_TEXTURE_SLOTS: usize = 32;

/// Slot assignment for one batch
#[derive(Debug)]
pub struct TextureSlotTable {
    slots: Vec<Rc<Texture2D>>,
    reserved: Option<Rc<Texture2D>>,
}

impl TextureSlotTable {
    /// Table whose slot 0 is permanently held by `reserved`
    pub fn with_reserved(reserved: Rc<Texture2D>) -> Self {
        let mut table = Self {
            slots: Vec::with_capacity(MAX_TEXTURE_SLOTS),
            reserved: Some(reserved),
        };
        table.reset();
        table
    }

    /// Table with every slot free
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(MAX_TEXTURE_SLOTS),
            reserved: None,
        }
    }

    /// Slot already holding `texture`, compared by GPU identity
    pub fn find(&self, texture: &Texture2D) -> Option<u32> {
        self.slots
            .iter()
            .position(|slot| **slot == *texture)
            .map(|index| index as u32)
    }

    /// Put `texture` in the next free slot
    pub fn assign(&mut self, texture: Rc<Texture2D>) -> BatchResult<u32> {
        if self.is_full() {
            return Err(BatchError::SlotsExhausted {
                max: MAX_TEXTURE_SLOTS,
            });
        }
        self.slots.push(texture);
        Ok(self.slots.len() as u32 - 1)
    }

    /// Whether no free slot is left
    pub fn is_full(&self) -> bool {
        self.slots.len() >= MAX_TEXTURE_SLOTS
    }

    /// Free every slot except the reserved one
    pub fn reset(&mut self) {
        self.slots.clear();
        if let Some(reserved) = &self.reserved {
            self.slots.push(Rc::clone(reserved));
        }
    }

    /// Index the next assigned texture will get
    pub fn next_index(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Number of textures assigned by this batch, excluding the reserved slot
    pub fn assigned_count(&self) -> usize {
        self.slots.len() - usize::from(self.reserved.is_some())
    }

    /// Bind every occupied slot
    pub fn bind_all(&self) -> RenderResult<()> {
        for (slot, texture) in self.slots.iter().enumerate() {
            texture.bind(slot as u32)?;
        }
        Ok(())
    }

    /// Texture in `slot`
    pub fn get(&self, slot: u32) -> Option<&Rc<Texture2D>> {
        self.slots.get(slot as usize)
    }
}

impl Default for TextureSlotTable {
    fn default() -> Self {
        Self::new()
    }
}
