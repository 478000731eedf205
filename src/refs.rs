//! Per-call identity stack for shared and cyclic reference preservation.
//!
//! The encoder consults the tracker once per value before classifying it and
//! registers the value on a miss; the decoder performs the same pushes in
//! the same order, so a back-reference index points at the same object on
//! both sides. The tracker is created lazily at the first composite value
//! and lives for a single top-level call.

use crate::value::Value;
use crate::{Error, Result};

enum Slot {
    /// A value without observable identity. This writer never emits a
    /// back-reference to such a slot; the slot exists only to keep encode
    /// and decode index spaces aligned.
    Leaf,
    /// A composite handle that a back-reference may target.
    Shared(Value),
}

/// Identity stack of the values registered so far in one call.
///
/// Lookup is a linear scan over raw handle addresses; serialized object
/// trees are shallow, so this beats any map.
#[derive(Default)]
pub struct RefTracker {
    slots: Vec<Slot>,
    saw_back_refs: bool,
}

impl RefTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True once any identity hit has been observed; hosts use this to tell
    /// whether a serialized graph contained sharing.
    pub fn saw_back_refs(&self) -> bool {
        self.saw_back_refs
    }

    /// Index of an already registered value, by handle identity.
    pub fn index_of(&mut self, value: &Value) -> Option<u32> {
        let needle = value.identity()?;
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Shared(v) = slot {
                if v.identity() == Some(needle) {
                    self.saw_back_refs = true;
                    return Some(index as u32);
                }
            }
        }
        None
    }

    /// Registers a value. Composites are retained by handle so later
    /// back-references can resolve to the same object.
    pub fn push(&mut self, value: &Value) {
        if value.is_composite() {
            self.slots.push(Slot::Shared(value.clone()));
        } else {
            self.slots.push(Slot::Leaf);
        }
    }

    /// Resolves a back-reference index.
    pub fn get(&self, index: u32) -> Result<Value> {
        match self.slots.get(index as usize) {
            Some(Slot::Shared(v)) => Ok(v.clone()),
            Some(Slot::Leaf) => Err(Error::Corrupt(format!(
                "back-reference {index} targets a non-shared value"
            ))),
            None => Err(Error::Corrupt(format!(
                "back-reference {index} is out of range (stack holds {})",
                self.slots.len()
            ))),
        }
    }
}
