//! Call correlation
//!
//! Maps outstanding invocations to pending results by call id. The
//! correlator never blocks and never times out on its own; waiting on a
//! result, with whatever timeout policy, belongs to the caller.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use nettable_core::{RpcCallId, Value};

/// Lifecycle of one invocation
#[derive(Clone, Debug, PartialEq)]
pub enum CallState {
    Pending,
    Completed(Value),
}

#[derive(Debug)]
struct CallRecord {
    name: String,
    state: CallState,
}

/// Pending-call table
///
/// Ids come from a monotonic counter, so an id is never reused while a
/// record for it is still Pending or unpolled-Completed.
#[derive(Default)]
pub struct RpcCorrelator {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    calls: HashMap<u64, CallRecord>,
}

impl RpcCorrelator {
    pub fn new() -> Self {
        RpcCorrelator::default()
    }

    /// Record a fresh Pending invocation and return its id; forwarding the
    /// call to the transport is the caller's job
    pub fn invoke(&self, name: &str) -> RpcCallId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.calls.insert(
            id,
            CallRecord {
                name: name.into(),
                state: CallState::Pending,
            },
        );
        debug!(call = id, name, "rpc invoked");
        RpcCallId::new(id)
    }

    /// Complete a Pending record. Unknown and already-completed ids are
    /// no-ops, which guards against duplicate or late delivery.
    pub fn deliver_result(&self, id: RpcCallId, result: Value) {
        let mut inner = self.inner.lock();
        match inner.calls.get_mut(&id.0) {
            Some(record) if record.state == CallState::Pending => {
                debug!(call = id.0, name = %record.name, "rpc completed");
                record.state = CallState::Completed(result);
            }
            Some(_) => debug!(call = id.0, "duplicate rpc result dropped"),
            None => debug!(call = id.0, "result for unknown rpc call dropped"),
        }
    }

    /// Non-blocking read of a Completed result, consuming the record; a
    /// second poll of the same id returns nothing, and a Pending id is
    /// left untouched
    pub fn poll(&self, id: RpcCallId) -> Option<Value> {
        let mut inner = self.inner.lock();
        let completed = matches!(
            inner.calls.get(&id.0),
            Some(CallRecord {
                state: CallState::Completed(_),
                ..
            })
        );
        if !completed {
            return None;
        }
        match inner.calls.remove(&id.0)?.state {
            CallState::Completed(result) => Some(result),
            CallState::Pending => None,
        }
    }

    /// Number of records still held (Pending or unpolled-Completed)
    pub fn outstanding(&self) -> usize {
        self.inner.lock().calls.len()
    }
}

/// Opaque parameter blob for an invocation, as carried by the transport
#[derive(Clone, Debug, PartialEq)]
pub struct RpcParams(pub Bytes);

impl RpcParams {
    pub fn new(data: impl Into<Bytes>) -> Self {
        RpcParams(data.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_returns_fresh_ids() {
        let correlator = RpcCorrelator::new();
        let a = correlator.invoke("/rpc/a");
        let b = correlator.invoke("/rpc/a");
        assert_ne!(a, b);
        assert_eq!(correlator.outstanding(), 2);
    }

    #[test]
    fn test_result_matched_by_call_id() {
        let correlator = RpcCorrelator::new();
        let a = correlator.invoke("/rpc/a");
        let b = correlator.invoke("/rpc/b");

        // Out-of-order delivery, matched strictly by id
        correlator.deliver_result(b, Value::Double(2.0));
        correlator.deliver_result(a, Value::Double(1.0));

        assert_eq!(correlator.poll(a), Some(Value::Double(1.0)));
        assert_eq!(correlator.poll(b), Some(Value::Double(2.0)));
    }

    #[test]
    fn test_poll_consumes_result() {
        let correlator = RpcCorrelator::new();
        let id = correlator.invoke("/rpc/a");
        correlator.deliver_result(id, Value::Boolean(true));

        assert_eq!(correlator.poll(id), Some(Value::Boolean(true)));
        assert_eq!(correlator.poll(id), None);
        assert_eq!(correlator.outstanding(), 0);
    }

    #[test]
    fn test_poll_pending_returns_nothing_without_consuming() {
        let correlator = RpcCorrelator::new();
        let id = correlator.invoke("/rpc/a");

        assert_eq!(correlator.poll(id), None);
        assert_eq!(correlator.outstanding(), 1);

        correlator.deliver_result(id, Value::Double(3.0));
        assert_eq!(correlator.poll(id), Some(Value::Double(3.0)));
    }

    #[test]
    fn test_duplicate_and_unknown_delivery_are_noops() {
        let correlator = RpcCorrelator::new();
        let id = correlator.invoke("/rpc/a");

        correlator.deliver_result(id, Value::Double(1.0));
        // Late duplicate must not overwrite
        correlator.deliver_result(id, Value::Double(9.0));
        assert_eq!(correlator.poll(id), Some(Value::Double(1.0)));

        // Unknown id
        correlator.deliver_result(RpcCallId::new(12345), Value::Boolean(true));
        assert_eq!(correlator.outstanding(), 0);
    }
}
