//! Procedure definitions
//!
//! A callable procedure is advertised as an entry holding an `Rpc` value:
//! the definition blob under the procedure's name. Peers discover
//! procedures the same way they discover any other entry.

use bytes::Bytes;

use nettable_core::Value;
use nettable_store::EntryStore;

/// Advertise a procedure by storing its definition blob under `name`
pub fn define(store: &EntryStore, name: &str, definition: impl Into<Bytes>) {
    store.set(name, Value::Rpc(definition.into()), None);
}

/// Withdraw a procedure; unknown names are a no-op
pub fn undefine(store: &EntryStore, name: &str) {
    store.delete(name);
}

/// Check whether `name` currently advertises a procedure
pub fn is_defined(store: &EntryStore, name: &str) -> bool {
    store.get(name).as_rpc().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nettable_store::Dispatcher;
    use std::sync::Arc;

    #[test]
    fn test_define_and_undefine() {
        let store = EntryStore::new(Arc::new(Dispatcher::new(64).unwrap()));

        define(&store, "/rpc/arm", Bytes::from_static(b"\x01def"));
        assert!(is_defined(&store, "/rpc/arm"));
        assert_eq!(
            store.get("/rpc/arm"),
            Value::Rpc(Bytes::from_static(b"\x01def"))
        );

        undefine(&store, "/rpc/arm");
        assert!(!is_defined(&store, "/rpc/arm"));

        // A non-rpc entry is not a procedure
        store.set("/plain", Value::Double(1.0), None);
        assert!(!is_defined(&store, "/plain"));
    }
}
