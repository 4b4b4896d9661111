//! Entry table - the plain name-to-entry map
//!
//! No locking and no notification here; [`crate::EntryStore`] wraps this
//! with the mutation protocol.

use std::collections::HashMap;

use nettable_core::{Entry, EntryInfo, KindMask};

/// The name-indexed entry map
#[derive(Debug, Default)]
pub struct EntryTable {
    entries: HashMap<String, Entry>,
}

impl EntryTable {
    pub fn new() -> Self {
        EntryTable::default()
    }

    /// Get an entry by name
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Get a mutable entry by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries.get_mut(name)
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    /// Remove an entry by name
    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        self.entries.remove(name)
    }

    /// Check if an entry exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Remove every entry, returning what was removed
    pub fn drain_all(&mut self) -> Vec<Entry> {
        self.entries.drain().map(|(_, e)| e).collect()
    }

    /// Iterate over entries matching a name prefix and kind mask
    pub fn matching<'a>(
        &'a self,
        prefix: &'a str,
        mask: KindMask,
    ) -> impl Iterator<Item = &'a Entry> {
        self.entries
            .values()
            .filter(move |e| e.name.starts_with(prefix) && mask.matches(e.value.kind()))
    }

    /// Enumeration snapshot, name-sorted so the order is stable for a
    /// given table state
    pub fn infos(&self, prefix: &str, mask: KindMask) -> Vec<EntryInfo> {
        let mut infos: Vec<EntryInfo> = self.matching(prefix, mask).map(Entry::info).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Name-sorted clones of the entries the persistence codec writes:
    /// Persistent flag set and a value actually assigned
    pub fn persistent_entries(&self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .entries
            .values()
            .filter(|e| e.flags.is_persistent() && !e.value.is_unassigned())
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}
