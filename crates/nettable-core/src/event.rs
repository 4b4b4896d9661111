//! Listener-facing events
//!
//! Every committed mutation produces an event (name, value, flags, kind)
//! that the dispatcher fans out to matching listeners after the store lock
//! has been released.

use crate::{EntryFlags, ListenerId, Value};

/// Event selection mask for entry listener registration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventMask(pub u32);

impl EventMask {
    pub const NONE: EventMask = EventMask(0);

    // Mask bits
    pub const NEW: u32 = 0x01;
    pub const UPDATE: u32 = 0x02;
    pub const FLAGS: u32 = 0x04;
    pub const DELETE: u32 = 0x08;
    /// Also deliver locally-originated mutations (remote is the default)
    pub const LOCAL: u32 = 0x10;
    /// Replay a New event for every matching entry at registration time
    pub const IMMEDIATE: u32 = 0x20;

    /// All mutation kinds, local and remote, without immediate replay
    pub const NOTIFY_ALL: EventMask =
        EventMask(Self::NEW | Self::UPDATE | Self::FLAGS | Self::DELETE | Self::LOCAL);

    #[inline]
    pub fn new(bits: u32) -> Self {
        EventMask(bits)
    }

    #[inline]
    pub fn wants_new(self) -> bool {
        self.0 & Self::NEW != 0
    }

    #[inline]
    pub fn wants_update(self) -> bool {
        self.0 & Self::UPDATE != 0
    }

    #[inline]
    pub fn wants_flags(self) -> bool {
        self.0 & Self::FLAGS != 0
    }

    #[inline]
    pub fn wants_delete(self) -> bool {
        self.0 & Self::DELETE != 0
    }

    #[inline]
    pub fn wants_local(self) -> bool {
        self.0 & Self::LOCAL != 0
    }

    #[inline]
    pub fn wants_immediate(self) -> bool {
        self.0 & Self::IMMEDIATE != 0
    }
}

/// What happened to an entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    New,
    ValueChanged,
    FlagsChanged,
    Deleted,
}

impl EventKind {
    /// The mask bit a listener must carry to receive this kind
    #[inline]
    pub fn mask_bit(self) -> u32 {
        match self {
            EventKind::New => EventMask::NEW,
            EventKind::ValueChanged => EventMask::UPDATE,
            EventKind::FlagsChanged => EventMask::FLAGS,
            EventKind::Deleted => EventMask::DELETE,
        }
    }
}

/// Entry event as delivered to one listener
#[derive(Clone, Debug)]
pub struct EntryEvent {
    /// The registration this delivery is for
    pub listener: ListenerId,
    pub name: String,
    /// Value after the mutation (last value for Deleted)
    pub value: Value,
    pub flags: EntryFlags,
    pub kind: EventKind,
    /// True when the mutation originated from a local API call
    pub local: bool,
}

/// One live peer link
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub remote_id: String,
    pub remote_addr: String,
    pub remote_port: u16,
    /// Milliseconds since the epoch of the last update seen from this peer
    pub last_update: u64,
    pub protocol_version: u16,
}

/// Connection event as delivered to one listener
///
/// A Disconnected event for a peer is never delivered before its matching
/// Connected event.
#[derive(Clone, Debug)]
pub struct ConnectionEvent {
    pub listener: ListenerId,
    pub connected: bool,
    pub info: ConnectionInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_accessors() {
        let mask = EventMask::new(EventMask::NEW | EventMask::DELETE);

        assert!(mask.wants_new());
        assert!(mask.wants_delete());
        assert!(!mask.wants_update());
        assert!(!mask.wants_flags());
        assert!(!mask.wants_local());
        assert!(!mask.wants_immediate());
    }

    #[test]
    fn test_notify_all_excludes_immediate() {
        assert!(EventMask::NOTIFY_ALL.wants_new());
        assert!(EventMask::NOTIFY_ALL.wants_update());
        assert!(EventMask::NOTIFY_ALL.wants_flags());
        assert!(EventMask::NOTIFY_ALL.wants_delete());
        assert!(EventMask::NOTIFY_ALL.wants_local());
        assert!(!EventMask::NOTIFY_ALL.wants_immediate());
    }

    #[test]
    fn test_kind_mask_bit() {
        assert_eq!(EventKind::New.mask_bit(), EventMask::NEW);
        assert_eq!(EventKind::ValueChanged.mask_bit(), EventMask::UPDATE);
        assert_eq!(EventKind::FlagsChanged.mask_bit(), EventMask::FLAGS);
        assert_eq!(EventKind::Deleted.mask_bit(), EventMask::DELETE);
    }
}
