//! Transport boundary
//!
//! The transport itself lives outside this crate; it is assumed to carry,
//! per peer, an ordered reliable stream. This module defines what crosses
//! the boundary: the update messages a transport sends for us, and the
//! bounded outbound queue it drains.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::warn;

use nettable_core::{EntryFlags, RpcCallId, Value};
use nettable_rpc::RpcParams;

/// One replicated message, in either direction
#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    /// Entry creation, carrying the full entry state
    EntryAssign {
        name: String,
        value: Value,
        flags: EntryFlags,
        sequence: u64,
    },
    /// Value change for an entry the peer already knows
    EntryUpdate {
        name: String,
        value: Value,
        sequence: u64,
    },
    FlagsUpdate {
        name: String,
        flags: EntryFlags,
    },
    EntryDelete {
        name: String,
    },
    ClearAll,
    RpcCall {
        call: RpcCallId,
        name: String,
        params: RpcParams,
    },
    RpcResponse {
        call: RpcCallId,
        result: Value,
    },
}

/// Bounded queue of outbound updates, drained by the transport
///
/// When full, the oldest update is dropped; newer state supersedes older
/// state for the same entry, and the peer's reconciliation discards
/// anything stale anyway.
pub struct OutboundQueue {
    updates: Mutex<VecDeque<Update>>,
    capacity: usize,
    flush_requested: AtomicBool,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        OutboundQueue {
            updates: Mutex::new(VecDeque::new()),
            capacity,
            flush_requested: AtomicBool::new(false),
        }
    }

    /// Queue one update for transmission
    pub fn push(&self, update: Update) {
        let mut updates = self.updates.lock();
        if updates.len() == self.capacity {
            updates.pop_front();
            warn!("outbound queue full, oldest update dropped");
        }
        updates.push_back(update);
    }

    /// Take everything queued so far, in order
    pub fn drain(&self) -> Vec<Update> {
        self.updates.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.updates.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.lock().is_empty()
    }

    /// Ask the transport to transmit ahead of its update-rate tick
    pub fn request_flush(&self) {
        self.flush_requested.store(true, Ordering::Release);
    }

    /// Consume a pending flush request, if any
    pub fn take_flush_request(&self) -> bool {
        self.flush_requested.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_preserves_order() {
        let queue = OutboundQueue::new(16);
        queue.push(Update::EntryDelete { name: "/a".into() });
        queue.push(Update::ClearAll);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], Update::EntryDelete { name: "/a".into() });
        assert_eq!(drained[1], Update::ClearAll);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let queue = OutboundQueue::new(2);
        queue.push(Update::EntryDelete { name: "/a".into() });
        queue.push(Update::EntryDelete { name: "/b".into() });
        queue.push(Update::EntryDelete { name: "/c".into() });

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], Update::EntryDelete { name: "/b".into() });
        assert_eq!(drained[1], Update::EntryDelete { name: "/c".into() });
    }

    #[test]
    fn test_flush_request_is_consumed() {
        let queue = OutboundQueue::new(4);
        assert!(!queue.take_flush_request());
        queue.request_flush();
        assert!(queue.take_flush_request());
        assert!(!queue.take_flush_request());
    }
}
