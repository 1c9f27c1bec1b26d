#![forbid(unsafe_code)]

//! Slot arena: stable keys for logical render positions.
//!
//! A position is identified by the slot of the component whose output
//! contains it, the child-index path from that output's root, and the
//! identity of the component definition placed there. Asking again for the
//! same triple returns the same key, so a component re-rendered in place
//! records its new output under the key it had before.

use ahash::AHashMap;
use rspy_core::SlotKey;
use smallvec::SmallVec;

/// Child-index path from the root of one recorded output.
pub type SlotPath = SmallVec<[u32; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Position {
    parent: SlotKey,
    path: SlotPath,
    def: usize,
}

/// Interning table for slot keys. [`SlotKey::ROOT`] is always present.
#[derive(Debug)]
pub struct SlotArena {
    index: AHashMap<Position, SlotKey>,
}

impl SlotArena {
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: AHashMap::new(),
        }
    }

    /// Key of the position `path` under `parent`, holding definition `def`.
    pub fn child(&mut self, parent: SlotKey, path: &[u32], def: usize) -> SlotKey {
        let position = Position {
            parent,
            path: SlotPath::from_slice(path),
            def,
        };
        if let Some(&key) = self.index.get(&position) {
            return key;
        }
        let key = SlotKey::new(u32::try_from(self.allocated()).unwrap_or(u32::MAX));
        self.index.insert(position, key);
        key
    }

    /// Number of keys handed out, including the root.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.index.len() + 1
    }
}

impl Default for SlotArena {
    fn default() -> Self {
        Self::new()
    }
}
