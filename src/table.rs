//! KeyTable: insert-only string-keyed storage with a precomputed-hash index.

use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

struct Slot<V> {
    key: Box<str>,
    value: V,
    hash: u64,
}

/// Error returned by [`KeyTable::insert`] when the key is already present.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct DuplicateKey;

/// Map from exact string keys to values, specialized for build-once tables:
/// entries can be inserted or overwritten but never removed, so slot
/// iteration order is insertion order and every `DefaultKey` handed out
/// stays valid for the life of the table.
///
/// Keys are matched byte-for-byte. Callers normalize before this layer
/// (case folding for attribute names and postal codes, zero padding for
/// county codes).
pub(crate) struct KeyTable<V> {
    hasher: RandomState,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Slot<V>>,
}

impl<V> KeyTable<V> {
    pub(crate) fn new() -> Self {
        Self {
            hasher: RandomState::new(),
            index: HashTable::new(),
            slots: SlotMap::with_key(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn find(&self, key: &str) -> Option<DefaultKey> {
        let hash = self.hasher.hash_one(key);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|s| &*s.key == key)
                    .unwrap_or(false)
            })
            .copied()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&V> {
        self.find(key).map(|k| &self.slots[k].value)
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Insert a new entry; the key must not already be present.
    pub(crate) fn insert(&mut self, key: Box<str>, value: V) -> Result<DefaultKey, DuplicateKey> {
        let hash = self.hasher.hash_one(&*key);
        match self.index.entry(
            hash,
            |&k| self.slots.get(k).map(|s| s.key == key).unwrap_or(false),
            |&k| self.slots.get(k).map(|s| s.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(_) => Err(DuplicateKey),
            hashbrown::hash_table::Entry::Vacant(v) => {
                let k = self.slots.insert(Slot { key, value, hash });
                let _ = v.insert(k);
                Ok(k)
            }
        }
    }

    /// Insert or overwrite. On overwrite the new value replaces the old one
    /// in place, keeping the entry's first-seen position in iteration order.
    pub(crate) fn put(&mut self, key: Box<str>, value: V) -> DefaultKey {
        let hash = self.hasher.hash_one(&*key);
        match self.index.entry(
            hash,
            |&k| self.slots.get(k).map(|s| s.key == key).unwrap_or(false),
            |&k| self.slots.get(k).map(|s| s.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(o) => {
                let k = *o.get();
                self.slots[k].value = value;
                k
            }
            hashbrown::hash_table::Entry::Vacant(v) => {
                let k = self.slots.insert(Slot { key, value, hash });
                let _ = v.insert(k);
                k
            }
        }
    }

    pub(crate) fn key_at(&self, k: DefaultKey) -> Option<&str> {
        self.slots.get(k).map(|s| &*s.key)
    }

    pub(crate) fn value_at(&self, k: DefaultKey) -> Option<&V> {
        self.slots.get(k).map(|s| &s.value)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = DefaultKey> + '_ {
        self.slots.keys()
    }

    /// Entries in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.slots.values().map(|s| (&*s.key, &s.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: duplicate keys are rejected by `insert` and the table is
    /// left unchanged.
    #[test]
    fn duplicate_insert_rejected() {
        let mut t: KeyTable<i32> = KeyTable::new();
        t.insert("A".into(), 1).unwrap();
        assert_eq!(t.insert("A".into(), 2), Err(DuplicateKey));
        assert_eq!(t.get("A"), Some(&1));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: `put` overwrites in place, keeping the first-seen position.
    #[test]
    fn put_overwrites_keeping_position() {
        let mut t: KeyTable<i32> = KeyTable::new();
        t.put("A".into(), 1);
        t.put("B".into(), 2);
        t.put("A".into(), 3);
        let entries: Vec<_> = t.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        assert_eq!(entries, vec![("A".to_string(), 3), ("B".to_string(), 2)]);
    }

    /// Invariant: keys are matched exactly; this layer does no folding.
    #[test]
    fn exact_match_only() {
        let mut t: KeyTable<i32> = KeyTable::new();
        t.insert("KEY".into(), 1).unwrap();
        assert!(t.contains("KEY"));
        assert!(!t.contains("key"));
        assert_eq!(t.get("key"), None);
    }

    /// Invariant: iteration yields entries in insertion order.
    #[test]
    fn iteration_is_insertion_ordered() {
        let mut t: KeyTable<i32> = KeyTable::new();
        for (i, k) in ["C", "A", "B"].iter().enumerate() {
            t.insert((*k).into(), i as i32).unwrap();
        }
        let keys: Vec<_> = t.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["C", "A", "B"]);
    }

    /// Invariant: slot accessors resolve every key handed out by insert.
    #[test]
    fn slot_accessors_resolve() {
        let mut t: KeyTable<i32> = KeyTable::new();
        let k = t.insert("A".into(), 7).unwrap();
        assert_eq!(t.key_at(k), Some("A"));
        assert_eq!(t.value_at(k), Some(&7));
        assert_eq!(t.find("A"), Some(k));
    }
}
