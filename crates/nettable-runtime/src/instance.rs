//! Table instance
//!
//! One explicitly constructed instance per process (by convention, not by
//! mechanism): it owns the store, the dispatcher, the correlator, the
//! connection registry, and the outbound queue, and presents the whole
//! table surface behind one handle. A server and its clients run the
//! same instance type; which side of the transport they sit on is the
//! transport's business.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use nettable_core::{
    ConnectionEvent, ConnectionInfo, EntryEvent, EntryFlags, EntryInfo, EventMask, KindMask,
    ListenerId, RpcCallId, TableResult, Value,
};
use nettable_persist::{load_persistent, save_persistent};
use nettable_rpc::{RpcCorrelator, RpcParams};
use nettable_store::{Dispatcher, EntryStore, SetOutcome};

use crate::transport::{OutboundQueue, Update};

/// Minimum accepted update interval
pub const MIN_UPDATE_RATE: Duration = Duration::from_millis(10);
/// Maximum accepted update interval
pub const MAX_UPDATE_RATE: Duration = Duration::from_secs(1);

/// Instance configuration
#[derive(Clone, Debug)]
pub struct InstanceConfig {
    /// Interval at which the transport flushes queued updates
    pub update_rate: Duration,
    /// Identity advertised to peers during the handshake
    pub network_identity: String,
    /// Notification queue depth
    pub event_queue_depth: usize,
    /// Outbound update queue depth
    pub outbound_queue_depth: usize,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        InstanceConfig {
            update_rate: Duration::from_millis(100),
            network_identity: "nettable".into(),
            event_queue_depth: 1024,
            outbound_queue_depth: 4096,
        }
    }
}

/// Server-side procedure body, run on the instance that defined the RPC
pub type RpcHandler = Box<dyn Fn(&RpcParams) -> Value + Send + Sync>;

/// The table facade
pub struct TableInstance {
    store: Arc<EntryStore>,
    rpc: RpcCorrelator,
    handlers: Mutex<HashMap<String, RpcHandler>>,
    connections: Mutex<HashMap<String, ConnectionInfo>>,
    outbound: OutboundQueue,
    update_rate: Mutex<Duration>,
    identity: Mutex<String>,
}

impl TableInstance {
    pub fn new(config: InstanceConfig) -> TableResult<Self> {
        let dispatcher = Arc::new(Dispatcher::new(config.event_queue_depth)?);
        Ok(TableInstance {
            store: Arc::new(EntryStore::new(dispatcher)),
            rpc: RpcCorrelator::new(),
            handlers: Mutex::new(HashMap::new()),
            connections: Mutex::new(HashMap::new()),
            outbound: OutboundQueue::new(config.outbound_queue_depth),
            update_rate: Mutex::new(clamp_update_rate(config.update_rate)),
            identity: Mutex::new(config.network_identity),
        })
    }

    pub fn with_defaults() -> TableResult<Self> {
        TableInstance::new(InstanceConfig::default())
    }

    /// The underlying store, for components layered on top
    pub fn store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    // --- table surface ---

    pub fn get_value(&self, name: &str) -> Value {
        self.store.get(name)
    }

    pub fn set_value(&self, name: &str, value: Value) {
        self.set_value_with_flags(name, value, None);
    }

    pub fn set_value_with_flags(&self, name: &str, value: Value, flags: Option<EntryFlags>) {
        let result = self.store.set(name, value.clone(), flags);
        let update = match result.outcome {
            SetOutcome::Created => Update::EntryAssign {
                name: name.into(),
                value,
                flags: self.store.get_flags(name),
                sequence: result.sequence,
            },
            _ => Update::EntryUpdate {
                name: name.into(),
                value,
                sequence: result.sequence,
            },
        };
        self.outbound.push(update);
    }

    pub fn set_flags(&self, name: &str, flags: EntryFlags) {
        if self.store.set_flags(name, flags) {
            self.outbound.push(Update::FlagsUpdate {
                name: name.into(),
                flags,
            });
        }
    }

    pub fn get_flags(&self, name: &str) -> EntryFlags {
        self.store.get_flags(name)
    }

    pub fn delete_entry(&self, name: &str) {
        if self.store.delete(name) {
            self.outbound.push(Update::EntryDelete { name: name.into() });
        }
    }

    pub fn delete_all_entries(&self) {
        self.store.delete_all();
        self.outbound.push(Update::ClearAll);
    }

    pub fn get_entry_info(&self, prefix: &str, mask: KindMask) -> Vec<EntryInfo> {
        self.store.get_entry_info(prefix, mask)
    }

    // --- listeners ---

    pub fn add_entry_listener(
        &self,
        prefix: &str,
        mask: EventMask,
        callback: impl Fn(&EntryEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.store.add_entry_listener(prefix, mask, callback)
    }

    pub fn remove_entry_listener(&self, id: ListenerId) {
        self.store.remove_entry_listener(id);
    }

    pub fn add_connection_listener(
        &self,
        callback: impl Fn(&ConnectionEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.store.dispatcher().add_connection_listener(Arc::new(callback))
    }

    pub fn remove_connection_listener(&self, id: ListenerId) {
        self.store.dispatcher().remove_connection_listener(id);
    }

    // --- rpc ---

    /// Advertise a procedure and install its body. The definition entry
    /// replicates like any other entry.
    pub fn create_rpc(
        &self,
        name: &str,
        definition: impl Into<Bytes>,
        handler: RpcHandler,
    ) -> TableResult<()> {
        self.set_value(name, Value::Rpc(definition.into()));
        self.handlers.lock().insert(name.into(), handler);
        Ok(())
    }

    /// Withdraw a procedure; unknown names are a no-op
    pub fn delete_rpc(&self, name: &str) {
        self.handlers.lock().remove(name);
        self.delete_entry(name);
    }

    /// Invoke a procedure, returning the call id without blocking.
    /// A locally-defined procedure runs immediately; anything else goes
    /// out through the transport.
    pub fn call_rpc(&self, name: &str, params: RpcParams) -> RpcCallId {
        let call = self.rpc.invoke(name);
        let local_result = self.handlers.lock().get(name).map(|h| h(&params));
        match local_result {
            Some(result) => self.rpc.deliver_result(call, result),
            None => self.outbound.push(Update::RpcCall {
                call,
                name: name.into(),
                params,
            }),
        }
        call
    }

    /// Non-blocking poll for a completed call; consumes the result
    pub fn get_rpc_result(&self, call: RpcCallId) -> Option<Value> {
        self.rpc.poll(call)
    }

    // --- replication ---

    /// Apply one inbound update from a connected peer
    pub fn apply_remote(&self, peer: &str, update: Update) {
        if let Some(info) = self.connections.lock().get_mut(peer) {
            info.last_update = now_millis();
        }
        match update {
            Update::EntryAssign {
                name,
                value,
                flags,
                sequence,
            } => {
                if self.store.apply_update(&name, value, sequence) != SetOutcome::Stale {
                    self.store.apply_flags(&name, flags);
                }
            }
            Update::EntryUpdate {
                name,
                value,
                sequence,
            } => {
                self.store.apply_update(&name, value, sequence);
            }
            Update::FlagsUpdate { name, flags } => self.store.apply_flags(&name, flags),
            Update::EntryDelete { name } => self.store.apply_delete(&name),
            Update::ClearAll => self.store.apply_clear(),
            Update::RpcCall { call, name, params } => {
                let result = self.handlers.lock().get(&name).map(|h| h(&params));
                match result {
                    Some(result) => self.outbound.push(Update::RpcResponse { call, result }),
                    None => debug!(%name, "rpc call for unknown procedure dropped"),
                }
            }
            Update::RpcResponse { call, result } => self.rpc.deliver_result(call, result),
        }
    }

    /// Take everything queued for transmission, in order
    pub fn drain_outbound(&self) -> Vec<Update> {
        self.outbound.drain()
    }

    /// Ask the transport to transmit ahead of the update-rate tick
    pub fn flush(&self) {
        self.outbound.request_flush();
    }

    /// Consume a pending flush request (transport side)
    pub fn take_flush_request(&self) -> bool {
        self.outbound.take_flush_request()
    }

    // --- connections ---

    /// Record a new peer link and notify connection listeners
    pub fn record_connected(&self, info: ConnectionInfo) {
        self.connections
            .lock()
            .insert(info.remote_id.clone(), info.clone());
        self.store.dispatcher().post_connection(true, info);
    }

    /// Record a peer going away; unknown peers are a no-op, which keeps
    /// Disconnected from ever preceding its Connected
    pub fn record_disconnected(&self, remote_id: &str) {
        let removed = self.connections.lock().remove(remote_id);
        if let Some(info) = removed {
            self.store.dispatcher().post_connection(false, info);
        }
    }

    /// Snapshot of the live peer links
    pub fn get_connections(&self) -> Vec<ConnectionInfo> {
        self.connections.lock().values().cloned().collect()
    }

    // --- configuration ---

    /// Set the transport flush interval, clamped to the accepted range
    pub fn set_update_rate(&self, interval: Duration) {
        *self.update_rate.lock() = clamp_update_rate(interval);
    }

    pub fn update_rate(&self) -> Duration {
        *self.update_rate.lock()
    }

    pub fn set_network_identity(&self, name: impl Into<String>) {
        *self.identity.lock() = name.into();
    }

    pub fn network_identity(&self) -> String {
        self.identity.lock().clone()
    }

    // --- persistence ---

    /// Write the Persistent-flagged entries to a file
    pub fn save_persistent(&self, path: impl AsRef<Path>) -> TableResult<()> {
        let file = File::create(path)?;
        save_persistent(&self.store, &mut BufWriter::new(file))
    }

    /// Restore entries from a file; per-line problems go to `warn`, only
    /// an unreadable file or bad header is an error
    pub fn load_persistent(
        &self,
        path: impl AsRef<Path>,
        warn: impl FnMut(usize, &str),
    ) -> TableResult<()> {
        let file = File::open(path)?;
        load_persistent(&self.store, BufReader::new(file), warn)
    }
}

fn clamp_update_rate(interval: Duration) -> Duration {
    interval.clamp(MIN_UPDATE_RATE, MAX_UPDATE_RATE)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
