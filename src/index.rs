//! Identity index for a directory snapshot.
//!
//! Maps each canonical identity key to a slot. Slots are handed out in the
//! order keys are first seen, and a later record with the same key replaces
//! the slot's content without moving it:
//!
//! - Lookup by key: O(1) average case (hash map)
//! - Iteration: first-occurrence order (slot array)

use rustc_hash::FxHashMap;

use crate::record::IdentityKey;
use crate::record::Record;

/// Records of one snapshot, addressable by identity key.
#[derive(Clone, Debug, Default)]
pub struct IdentityIndex {
    /// Map from identity key to slot.
    key_to_slot: FxHashMap<IdentityKey, usize>,
    /// Records in first-seen order.
    slots: Vec<Record>,
}

impl IdentityIndex {
    /// Create a new empty index.
    pub fn new() -> IdentityIndex {
        return IdentityIndex {
            key_to_slot: FxHashMap::default(),
            slots: Vec::new(),
        };
    }

    /// Index every record of a snapshot.
    pub fn build<I>(records: I) -> IdentityIndex
    where
        I: IntoIterator<Item = Record>,
    {
        let mut index = IdentityIndex::new();
        for record in records {
            index.insert(record);
        }
        return index;
    }

    /// Insert a record, returning its slot.
    ///
    /// If the key was seen before, the record replaces the earlier one but
    /// keeps the earlier slot.
    pub fn insert(&mut self, record: Record) -> usize {
        if let Some(&slot) = self.key_to_slot.get(&record.key) {
            self.slots[slot] = record;
            return slot;
        }

        let slot = self.slots.len();
        self.key_to_slot.insert(record.key.clone(), slot);
        self.slots.push(record);
        return slot;
    }

    #[inline]
    pub fn get(&self, key: &IdentityKey) -> Option<&Record> {
        let slot = *self.key_to_slot.get(key)?;
        return self.slots.get(slot);
    }

    #[inline]
    pub fn get_mut(&mut self, key: &IdentityKey) -> Option<&mut Record> {
        let slot = *self.key_to_slot.get(key)?;
        return self.slots.get_mut(slot);
    }

    #[inline]
    pub fn contains(&self, key: &IdentityKey) -> bool {
        return self.key_to_slot.contains_key(key);
    }

    /// Number of distinct identities.
    #[inline]
    pub fn len(&self) -> usize {
        return self.slots.len();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        return self.slots.is_empty();
    }

    /// Keys in first-occurrence order.
    pub fn keys(&self) -> impl Iterator<Item = &IdentityKey> {
        return self.slots.iter().map(|record| &record.key);
    }

    /// Records in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        return self.slots.iter();
    }
}
