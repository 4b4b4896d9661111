//! Entries - named slots holding one value, flags, and a change sequence

use crate::{Value, ValueKind};

/// Entry flags (persistent and future bits)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryFlags(pub u32);

impl EntryFlags {
    pub const NONE: EntryFlags = EntryFlags(0);

    // Flag bits
    pub const PERSISTENT: u32 = 0x01;

    #[inline]
    pub fn new(bits: u32) -> Self {
        EntryFlags(bits)
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_persistent(self) -> bool {
        self.0 & Self::PERSISTENT != 0
    }

    #[inline]
    pub fn set_persistent(&mut self, value: bool) {
        if value {
            self.0 |= Self::PERSISTENT;
        } else {
            self.0 &= !Self::PERSISTENT;
        }
    }
}

impl From<u32> for EntryFlags {
    fn from(bits: u32) -> Self {
        EntryFlags(bits)
    }
}

impl From<EntryFlags> for u32 {
    fn from(flags: EntryFlags) -> Self {
        flags.0
    }
}

/// A named slot in the table
///
/// `sequence` is the entry's logical clock: it strictly increases every
/// time the value changes and drives last-writer-wins reconciliation.
/// It is not a wall-clock timestamp.
#[derive(Clone, Debug)]
pub struct Entry {
    pub name: String,
    pub value: Value,
    pub flags: EntryFlags,
    pub sequence: u64,
}

impl Entry {
    pub fn new(name: impl Into<String>) -> Self {
        Entry {
            name: name.into(),
            value: Value::Unassigned,
            flags: EntryFlags::NONE,
            sequence: 0,
        }
    }

    /// Read-only snapshot for enumeration queries
    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            name: self.name.clone(),
            kind: self.value.kind(),
            flags: self.flags,
            sequence: self.sequence,
        }
    }
}

/// Point-in-time view of one entry, as returned by enumeration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub kind: ValueKind,
    pub flags: EntryFlags,
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_operations() {
        let mut flags = EntryFlags::NONE;

        assert!(!flags.is_persistent());
        flags.set_persistent(true);
        assert!(flags.is_persistent());
        flags.set_persistent(false);
        assert!(!flags.is_persistent());
    }

    #[test]
    fn test_entry_info_snapshot() {
        let mut entry = Entry::new("/robot/mode");
        entry.value = Value::Str("auto".into());
        entry.sequence = 3;
        entry.flags.set_persistent(true);

        let info = entry.info();
        assert_eq!(info.name, "/robot/mode");
        assert_eq!(info.kind, ValueKind::Str);
        assert_eq!(info.sequence, 3);
        assert!(info.flags.is_persistent());
    }
}
