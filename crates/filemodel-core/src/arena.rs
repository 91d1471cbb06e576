//! Arena owning every node of a model tree
//!
//! Nodes are addressed by generational handles. Parents refer to children by
//! handle, so one node can be shared by several parents, and the model cache
//! can hold handles without owning anything: once a slot is released its
//! generation moves on and every outstanding handle to it reads as absent.

use crate::model::{FileModel, ModelNode};
use crate::traverse::TreeTraverser;
use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;

/// Stable handle to a node in a [`ModelArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId {
    index: u32,
    generation: u32,
}

impl ModelId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

enum SlotState {
    Vacant,
    /// Reserved while the node's children are being constructed
    Pending,
    Occupied(Box<dyn ModelNode>),
}

struct Slot {
    generation: u32,
    state: SlotState,
}

/// Owner of all model nodes.
#[derive(Default)]
pub struct ModelArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl fmt::Debug for ModelArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArena")
            .field("slots", &self.slots.len())
            .field("live", &self.live)
            .finish()
    }
}

impl ModelArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, state: SlotState) -> ModelId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.state = state;
            return ModelId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            state,
        });
        ModelId {
            index,
            generation: 0,
        }
    }

    fn slot(&self, id: ModelId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    fn slot_mut(&mut self, id: ModelId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    /// Add a node and return its handle.
    pub fn insert<N: ModelNode>(&mut self, node: N) -> ModelId {
        self.insert_boxed(Box::new(node))
    }

    pub fn insert_boxed(&mut self, node: Box<dyn ModelNode>) -> ModelId {
        self.allocate(SlotState::Occupied(node))
    }

    /// Reserve a handle for a node that is still being constructed.
    pub fn reserve(&mut self) -> ModelId {
        self.allocate(SlotState::Pending)
    }

    /// Store the node for a handle obtained from [`reserve`](Self::reserve).
    pub fn fill(&mut self, id: ModelId, node: Box<dyn ModelNode>) -> Result<()> {
        match self.slot_mut(id) {
            Some(slot) if !matches!(slot.state, SlotState::Vacant) => {
                slot.state = SlotState::Occupied(node);
                Ok(())
            }
            _ => Err(Error::ModelMissing { id }),
        }
    }

    /// Drop a node (or a pending reservation) and invalidate its handle.
    pub fn remove(&mut self, id: ModelId) -> Option<Box<dyn ModelNode>> {
        let slot = self.slot_mut(id)?;
        let state = std::mem::replace(&mut slot.state, SlotState::Vacant);
        if matches!(state, SlotState::Vacant) {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;

        match state {
            SlotState::Occupied(node) => Some(node),
            _ => None,
        }
    }

    /// Drop a pending or live slot. Returns whether anything was released.
    pub fn release(&mut self, id: ModelId) -> bool {
        let live = self.contains(id);
        self.remove(id);
        live
    }

    /// Whether `id` refers to a live or pending node.
    pub fn contains(&self, id: ModelId) -> bool {
        self.slot(id)
            .is_some_and(|slot| !matches!(slot.state, SlotState::Vacant))
    }

    pub fn is_pending(&self, id: ModelId) -> bool {
        self.slot(id)
            .is_some_and(|slot| matches!(slot.state, SlotState::Pending))
    }

    pub fn node(&self, id: ModelId) -> Option<&dyn ModelNode> {
        match &self.slot(id)?.state {
            SlotState::Occupied(node) => Some(&**node),
            _ => None,
        }
    }

    pub fn node_mut(&mut self, id: ModelId) -> Option<&mut dyn ModelNode> {
        match &mut self.slot_mut(id)?.state {
            SlotState::Occupied(node) => Some(&mut **node),
            _ => None,
        }
    }

    /// Borrow a node as its concrete type.
    pub fn get<T: ModelNode>(&self, id: ModelId) -> Option<&T> {
        let node = self.node(id)?;
        node.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: ModelNode>(&mut self, id: ModelId) -> Option<&mut T> {
        let node = self.node_mut(id)?;
        node.as_any_mut().downcast_mut::<T>()
    }

    /// Like [`get`](Self::get), but explains why the node is unavailable.
    pub fn typed<T: ModelNode>(&self, id: ModelId) -> Result<&T> {
        let node = self.node(id).ok_or(Error::ModelMissing { id })?;
        node.as_any().downcast_ref::<T>().ok_or(Error::KindMismatch {
            id,
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn typed_mut<T: ModelNode>(&mut self, id: ModelId) -> Result<&mut T> {
        let node = self.node_mut(id).ok_or(Error::ModelMissing { id })?;
        node.as_any_mut()
            .downcast_mut::<T>()
            .ok_or(Error::KindMismatch {
                id,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Borrow the file-backed view of a node.
    pub fn file(&self, id: ModelId) -> Result<&dyn FileModel> {
        let node = self.node(id).ok_or(Error::ModelMissing { id })?;
        node.file_model().ok_or(Error::NotFileBacked { id })
    }

    pub fn file_mut(&mut self, id: ModelId) -> Result<&mut dyn FileModel> {
        let node = self.node_mut(id).ok_or(Error::ModelMissing { id })?;
        node.file_model_mut().ok_or(Error::NotFileBacked { id })
    }

    /// Number of live and pending nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Handles of every constructed node, in slot order.
    pub fn ids(&self) -> Vec<ModelId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot.state, SlotState::Occupied(_)))
            .map(|(index, slot)| ModelId {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    /// Drop every constructed node that cannot be reached from `roots`.
    ///
    /// Returns the number of nodes removed. Pending reservations are kept.
    pub fn retain_reachable(&mut self, roots: &[ModelId]) -> Result<usize> {
        let mut reachable = HashSet::new();
        for &root in roots {
            if self.node(root).is_none() {
                continue;
            }
            reachable = TreeTraverser::new()
                .pre_visit(|_, id, mut acc: HashSet<ModelId>| {
                    acc.insert(id);
                    Ok(acc)
                })
                .traverse(self, root, reachable)?;
        }

        let unreachable: Vec<ModelId> = self
            .ids()
            .into_iter()
            .filter(|id| !reachable.contains(id))
            .collect();
        for &id in &unreachable {
            self.remove(id);
        }

        tracing::debug!(removed = unreachable.len(), live = self.live, "Pruned unreachable models");
        Ok(unreachable.len())
    }
}
