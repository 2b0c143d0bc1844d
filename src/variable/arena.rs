//! Generational storage for the variables owned by a cursor.
//!
//! Variables are addressed by [`VarId`]. A slot's generation advances each
//! time its variable is released, so ids held by callers after a release
//! resolve to an error instead of to an unrelated variable.

use std::collections::HashMap;

use tracing::trace;

use super::Variable;
use crate::error::{Error, Result};
use crate::native::{BindTarget, BufferView};

/// Identifier of a variable inside a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId {
    index: u32,
    generation: u32,
}

/// Who is responsible for releasing a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// Created by the binder or define step; released when detached.
    Internal,
    /// Created by the caller; released only on request.
    External,
}

struct Slot {
    generation: u32,
    entry: Option<(Variable, Origin)>,
}

#[derive(Default)]
pub(crate) struct VariableArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl VariableArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut var: Variable, origin: Origin) -> VarId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = VarId {
            index,
            generation: slot.generation,
        };
        var.id = Some(id);
        slot.entry = Some((var, origin));
        id
    }

    fn slot(&self, id: VarId) -> Option<&(Variable, Origin)> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn contains(&self, id: VarId) -> bool {
        self.slot(id).is_some()
    }

    pub fn get(&self, id: VarId) -> Result<&Variable> {
        self.slot(id)
            .map(|(var, _)| var)
            .ok_or_else(|| Error::programming("variable no longer exists"))
    }

    pub fn get_mut(&mut self, id: VarId) -> Result<&mut Variable> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .map(|(var, _)| var)
            .ok_or_else(|| Error::programming("variable no longer exists"))
    }

    pub fn origin(&self, id: VarId) -> Option<Origin> {
        self.slot(id).map(|(_, origin)| *origin)
    }

    /// Remove a variable regardless of origin. Dropping it frees its descriptors.
    pub fn release(&mut self, id: VarId) -> bool {
        let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation && slot.entry.is_some())
        else {
            return false;
        };
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        trace!(?id, "released variable");
        true
    }

    /// Remove a variable only if the engine created it.
    pub fn release_internal(&mut self, id: VarId) {
        if self.origin(id) == Some(Origin::Internal) {
            self.release(id);
        }
    }

    /// Borrow buffer views for a set of variables at once.
    pub fn views(&mut self, targets: &[(VarId, BindTarget)]) -> Result<Vec<BufferView<'_>>> {
        let mut wanted: HashMap<u32, BindTarget> = HashMap::with_capacity(targets.len());
        for (id, target) in targets {
            if !self.contains(*id) {
                return Err(Error::programming("variable no longer exists"));
            }
            wanted.insert(id.index, target.clone());
        }
        Ok(self
            .slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                let target = wanted.remove(&(index as u32))?;
                slot.entry
                    .as_mut()
                    .map(|(var, _)| var.buffer_view(target))
            })
            .collect())
    }
}
