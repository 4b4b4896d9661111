//! Entry store - the single shared mutable resource
//!
//! One mutex guards the whole table. Every mutation commits under the
//! lock, collects its notifications, releases the lock, and only then
//! posts to the dispatcher, so listener callbacks never run inside the
//! critical section.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use nettable_core::{
    Entry, EntryEvent, EntryFlags, EntryInfo, EventKind, EventMask, KindMask, ListenerId, Value,
};

use crate::notify::{Dispatcher, EntryCallback};
use crate::table::EntryTable;

/// How the store handled one update
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOutcome {
    /// Entry did not exist before
    Created,
    /// Entry existed; the update won and replaced the value
    Applied,
    /// Update sequence was not greater than the stored one; discarded
    Stale,
}

/// Result of a local set
#[derive(Clone, Copy, Debug)]
pub struct SetResult {
    pub outcome: SetOutcome,
    /// Sequence number the entry holds after the call
    pub sequence: u64,
}

struct Pending {
    name: String,
    value: Value,
    flags: EntryFlags,
    kind: EventKind,
    local: bool,
}

/// The entry store: table, lock, and reconciliation rule
pub struct EntryStore {
    table: Mutex<EntryTable>,
    dispatcher: Arc<Dispatcher>,
}

impl EntryStore {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        EntryStore {
            table: Mutex::new(EntryTable::new()),
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Current value of an entry; `Unassigned` when the name is unknown
    /// or known but valueless
    pub fn get(&self, name: &str) -> Value {
        self.table
            .lock()
            .get(name)
            .map(|e| e.value.clone())
            .unwrap_or(Value::Unassigned)
    }

    /// Local set: creates the entry if absent, otherwise bumps the
    /// sequence and replaces the value. An equal value still bumps the
    /// sequence and still notifies.
    pub fn set(&self, name: &str, value: Value, flags: Option<EntryFlags>) -> SetResult {
        let mut pending = Vec::with_capacity(2);
        let result = {
            let mut table = self.table.lock();
            match table.get_mut(name) {
                Some(entry) => {
                    entry.sequence += 1;
                    entry.value = value;
                    if let Some(new_flags) = flags {
                        if new_flags != entry.flags {
                            entry.flags = new_flags;
                            pending.push(Pending {
                                name: name.into(),
                                value: entry.value.clone(),
                                flags: entry.flags,
                                kind: EventKind::FlagsChanged,
                                local: true,
                            });
                        }
                    }
                    pending.push(Pending {
                        name: name.into(),
                        value: entry.value.clone(),
                        flags: entry.flags,
                        kind: EventKind::ValueChanged,
                        local: true,
                    });
                    SetResult {
                        outcome: SetOutcome::Applied,
                        sequence: entry.sequence,
                    }
                }
                None => {
                    let mut entry = Entry::new(name);
                    entry.value = value;
                    entry.flags = flags.unwrap_or(EntryFlags::NONE);
                    entry.sequence = 1;
                    pending.push(Pending {
                        name: name.into(),
                        value: entry.value.clone(),
                        flags: entry.flags,
                        kind: EventKind::New,
                        local: true,
                    });
                    table.insert(entry);
                    SetResult {
                        outcome: SetOutcome::Created,
                        sequence: 1,
                    }
                }
            }
        };
        self.post_all(pending);
        result
    }

    /// Replicated set: the reconciliation rule. The update is applied only
    /// if the entry does not exist or its sequence is strictly greater
    /// than the stored one; anything else is a stale echo and is dropped.
    pub fn apply_update(&self, name: &str, value: Value, sequence: u64) -> SetOutcome {
        let mut pending = Vec::with_capacity(1);
        let outcome = {
            let mut table = self.table.lock();
            match table.get_mut(name) {
                Some(entry) if sequence > entry.sequence => {
                    entry.sequence = sequence;
                    entry.value = value;
                    pending.push(Pending {
                        name: name.into(),
                        value: entry.value.clone(),
                        flags: entry.flags,
                        kind: EventKind::ValueChanged,
                        local: false,
                    });
                    SetOutcome::Applied
                }
                Some(entry) => {
                    debug!(
                        name,
                        incoming = sequence,
                        current = entry.sequence,
                        "stale update discarded"
                    );
                    SetOutcome::Stale
                }
                None => {
                    let mut entry = Entry::new(name);
                    entry.value = value;
                    entry.sequence = sequence;
                    pending.push(Pending {
                        name: name.into(),
                        value: entry.value.clone(),
                        flags: entry.flags,
                        kind: EventKind::New,
                        local: false,
                    });
                    table.insert(entry);
                    SetOutcome::Created
                }
            }
        };
        self.post_all(pending);
        outcome
    }

    /// Local flag change; unknown names and unchanged flags are no-ops.
    /// Returns whether the flags actually changed.
    pub fn set_flags(&self, name: &str, flags: EntryFlags) -> bool {
        self.change_flags(name, flags, true)
    }

    /// Replicated flag change
    pub fn apply_flags(&self, name: &str, flags: EntryFlags) {
        self.change_flags(name, flags, false);
    }

    fn change_flags(&self, name: &str, flags: EntryFlags, local: bool) -> bool {
        let mut pending = Vec::with_capacity(1);
        let changed = {
            let mut table = self.table.lock();
            match table.get_mut(name) {
                Some(entry) if entry.flags != flags => {
                    entry.flags = flags;
                    pending.push(Pending {
                        name: name.into(),
                        value: entry.value.clone(),
                        flags,
                        kind: EventKind::FlagsChanged,
                        local,
                    });
                    true
                }
                _ => false,
            }
        };
        self.post_all(pending);
        changed
    }

    /// Flags of an entry; empty for an unknown name
    pub fn get_flags(&self, name: &str) -> EntryFlags {
        self.table
            .lock()
            .get(name)
            .map(|e| e.flags)
            .unwrap_or(EntryFlags::NONE)
    }

    /// Local delete; idempotent, absent names produce no event. Returns
    /// whether an entry was actually removed.
    pub fn delete(&self, name: &str) -> bool {
        self.remove_entry(name, true)
    }

    /// Replicated delete
    pub fn apply_delete(&self, name: &str) {
        self.remove_entry(name, false);
    }

    fn remove_entry(&self, name: &str, local: bool) -> bool {
        let mut pending = Vec::with_capacity(1);
        let removed = {
            let mut table = self.table.lock();
            match table.remove(name) {
                Some(entry) => {
                    pending.push(Pending {
                        name: entry.name,
                        value: entry.value,
                        flags: entry.flags,
                        kind: EventKind::Deleted,
                        local,
                    });
                    true
                }
                None => false,
            }
        };
        self.post_all(pending);
        removed
    }

    /// Local clear: removes every entry under one lock acquisition and
    /// queues one Deleted event per entry before returning
    pub fn delete_all(&self) {
        self.clear(true);
    }

    /// Replicated clear
    pub fn apply_clear(&self) {
        self.clear(false);
    }

    fn clear(&self, local: bool) {
        let removed = self.table.lock().drain_all();
        let pending = removed
            .into_iter()
            .map(|entry| Pending {
                name: entry.name,
                value: entry.value,
                flags: entry.flags,
                kind: EventKind::Deleted,
                local,
            })
            .collect();
        self.post_all(pending);
    }

    /// Enumeration snapshot; prefix `""` matches every name, `ANY`
    /// matches every kind
    pub fn get_entry_info(&self, prefix: &str, mask: KindMask) -> Vec<EntryInfo> {
        self.table.lock().infos(prefix, mask)
    }

    /// Restore path used by the persistence codec: the loaded value wins
    /// over whatever is in memory and the entry is tagged persistent
    pub fn load_entry(&self, name: &str, value: Value) {
        let mut pending = Vec::with_capacity(1);
        {
            let mut table = self.table.lock();
            match table.get_mut(name) {
                Some(entry) => {
                    entry.sequence += 1;
                    entry.value = value;
                    entry.flags.set_persistent(true);
                    pending.push(Pending {
                        name: name.into(),
                        value: entry.value.clone(),
                        flags: entry.flags,
                        kind: EventKind::ValueChanged,
                        local: true,
                    });
                }
                None => {
                    let mut entry = Entry::new(name);
                    entry.value = value;
                    entry.sequence = 1;
                    entry.flags.set_persistent(true);
                    pending.push(Pending {
                        name: name.into(),
                        value: entry.value.clone(),
                        flags: entry.flags,
                        kind: EventKind::New,
                        local: true,
                    });
                    table.insert(entry);
                }
            }
        }
        self.post_all(pending);
    }

    /// Name-sorted snapshot of the entries the persistence codec writes
    pub fn persistent_snapshot(&self) -> Vec<Entry> {
        self.table.lock().persistent_entries()
    }

    /// Stored sequence number of an entry, if it exists
    pub fn sequence(&self, name: &str) -> Option<u64> {
        self.table.lock().get(name).map(|e| e.sequence)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Register an entry listener. With `IMMEDIATE` in the mask, a New
    /// event is replayed synchronously for every matching entry before
    /// this call returns, so a late subscriber observes the initial state.
    pub fn add_entry_listener(
        &self,
        prefix: &str,
        mask: EventMask,
        callback: impl Fn(&EntryEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let callback: EntryCallback = Arc::new(callback);
        let id = self
            .dispatcher
            .add_entry_listener(prefix, mask, Arc::clone(&callback));

        if mask.wants_immediate() {
            let snapshot: Vec<(String, Value, EntryFlags)> = {
                let table = self.table.lock();
                table
                    .matching(prefix, KindMask::ANY)
                    .map(|e| (e.name.clone(), e.value.clone(), e.flags))
                    .collect()
            };
            for (name, value, flags) in snapshot {
                callback(&EntryEvent {
                    listener: id,
                    name,
                    value,
                    flags,
                    kind: EventKind::New,
                    local: true,
                });
            }
        }
        id
    }

    /// Remove an entry listener; an unknown id is a no-op
    pub fn remove_entry_listener(&self, id: ListenerId) {
        self.dispatcher.remove_entry_listener(id);
    }

    fn post_all(&self, pending: Vec<Pending>) {
        for p in pending {
            self.dispatcher
                .post_entry(p.name, p.value, p.flags, p.kind, p.local);
        }
    }
}
