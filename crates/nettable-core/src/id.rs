//! Opaque identifiers handed out by registries
//!
//! Ids come from monotonic counters and are never reused while the record
//! behind them is live.

use std::fmt;

/// Listener registration identity (entry or connection listener)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ListenerId(pub u64);

impl ListenerId {
    #[inline]
    pub fn new(id: u64) -> Self {
        ListenerId(id)
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({})", self.0)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outstanding RPC invocation identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RpcCallId(pub u64);

impl RpcCallId {
    #[inline]
    pub fn new(id: u64) -> Self {
        RpcCallId(id)
    }
}

impl fmt::Debug for RpcCallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RpcCall({})", self.0)
    }
}

impl fmt::Display for RpcCallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
