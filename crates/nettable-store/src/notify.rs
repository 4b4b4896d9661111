//! Listener dispatch
//!
//! A bounded queue decouples mutation from notification: the store posts a
//! notification after committing and releasing its lock, and a dedicated
//! notifier thread drains the queue and invokes callbacks. A callback can
//! therefore call back into the store without deadlocking.
//!
//! Listener matching happens at drain time, so removing a listener takes
//! effect for everything not yet dispatched, including events that were
//! already queued.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use nettable_core::{
    ConnectionEvent, ConnectionInfo, EntryEvent, EntryFlags, EventKind, EventMask, ListenerId,
    TableResult, Value,
};

/// Entry listener callback
pub type EntryCallback = Arc<dyn Fn(&EntryEvent) + Send + Sync>;
/// Connection listener callback
pub type ConnectionCallback = Arc<dyn Fn(&ConnectionEvent) + Send + Sync>;

struct EntryListener {
    prefix: String,
    mask: EventMask,
    callback: EntryCallback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entry: HashMap<u64, EntryListener>,
    connection: HashMap<u64, ConnectionCallback>,
}

impl Registry {
    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId::new(self.next_id)
    }
}

/// One committed mutation, queued for fan-out
pub(crate) enum Notification {
    Entry {
        name: String,
        value: Value,
        flags: EntryFlags,
        kind: EventKind,
        local: bool,
    },
    Connection {
        connected: bool,
        info: ConnectionInfo,
    },
    /// Queue marker: acknowledged by the notifier, delivered to no listener
    Sync(std::sync::mpsc::SyncSender<()>),
}

/// Listener registry plus the notification queue and its drain thread
pub struct Dispatcher {
    registry: Arc<Mutex<Registry>>,
    tx: Option<mpsc::Sender<Notification>>,
    notifier: Option<thread::JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn the notifier thread behind a queue of the given depth
    ///
    /// The queue bounds how far notification can fall behind mutation:
    /// when it is full, the newest event is dropped with a warning rather
    /// than blocking the mutating thread. Listeners that must observe
    /// every event need a depth sized for their worst-case burst.
    pub fn new(queue_depth: usize) -> TableResult<Self> {
        let (tx, mut rx) = mpsc::channel::<Notification>(queue_depth);
        let registry = Arc::new(Mutex::new(Registry::default()));

        let drain_registry = Arc::clone(&registry);
        let notifier = thread::Builder::new()
            .name("nt-notifier".into())
            .spawn(move || {
                while let Some(notification) = rx.blocking_recv() {
                    dispatch(&drain_registry, &notification);
                }
            })?;

        Ok(Dispatcher {
            registry,
            tx: Some(tx),
            notifier: Some(notifier),
        })
    }

    /// Register an entry listener; matching is by name prefix and mask
    pub fn add_entry_listener(
        &self,
        prefix: impl Into<String>,
        mask: EventMask,
        callback: EntryCallback,
    ) -> ListenerId {
        let mut registry = self.registry.lock();
        let id = registry.allocate();
        registry.entry.insert(
            id.0,
            EntryListener {
                prefix: prefix.into(),
                mask,
                callback,
            },
        );
        id
    }

    /// Remove an entry listener; an unknown id is a no-op
    pub fn remove_entry_listener(&self, id: ListenerId) {
        self.registry.lock().entry.remove(&id.0);
    }

    /// Register a connection listener
    pub fn add_connection_listener(&self, callback: ConnectionCallback) -> ListenerId {
        let mut registry = self.registry.lock();
        let id = registry.allocate();
        registry.connection.insert(id.0, callback);
        id
    }

    /// Remove a connection listener; an unknown id is a no-op
    pub fn remove_connection_listener(&self, id: ListenerId) {
        self.registry.lock().connection.remove(&id.0);
    }

    /// Queue an entry notification; must be called with no store lock held
    pub(crate) fn post_entry(
        &self,
        name: String,
        value: Value,
        flags: EntryFlags,
        kind: EventKind,
        local: bool,
    ) {
        self.post(Notification::Entry {
            name,
            value,
            flags,
            kind,
            local,
        });
    }

    /// Queue a connection notification
    pub fn post_connection(&self, connected: bool, info: ConnectionInfo) {
        self.post(Notification::Connection { connected, info });
    }

    fn post(&self, notification: Notification) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("notification queue full, event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("notification queue closed, event dropped");
            }
        }
    }

    /// Block until every notification queued so far has been dispatched
    ///
    /// A marker travels through the same queue as ordinary notifications,
    /// so its acknowledgement proves everything ahead of it was delivered.
    pub fn sync(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (done_tx, done_rx) = std::sync::mpsc::sync_channel(1);
        if tx.blocking_send(Notification::Sync(done_tx)).is_ok() {
            let _ = done_rx.recv_timeout(std::time::Duration::from_secs(5));
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Closing the channel ends the notifier loop
        self.tx.take();
        if let Some(handle) = self.notifier.take() {
            let _ = handle.join();
        }
    }
}

fn dispatch(registry: &Mutex<Registry>, notification: &Notification) {
    match notification {
        Notification::Entry {
            name,
            value,
            flags,
            kind,
            local,
        } => {
            // Snapshot matching callbacks, then invoke with no lock held
            let targets: Vec<(ListenerId, EntryCallback)> = {
                let registry = registry.lock();
                registry
                    .entry
                    .iter()
                    .filter(|(_, l)| {
                        name.starts_with(&l.prefix)
                            && l.mask.0 & kind.mask_bit() != 0
                            && (!local || l.mask.wants_local())
                    })
                    .map(|(&id, l)| (ListenerId::new(id), Arc::clone(&l.callback)))
                    .collect()
            };
            for (listener, callback) in targets {
                callback(&EntryEvent {
                    listener,
                    name: name.clone(),
                    value: value.clone(),
                    flags: *flags,
                    kind: *kind,
                    local: *local,
                });
            }
        }
        Notification::Connection { connected, info } => {
            let targets: Vec<(ListenerId, ConnectionCallback)> = {
                let registry = registry.lock();
                registry
                    .connection
                    .iter()
                    .map(|(&id, cb)| (ListenerId::new(id), Arc::clone(cb)))
                    .collect()
            };
            for (listener, callback) in targets {
                callback(&ConnectionEvent {
                    listener,
                    connected: *connected,
                    info: info.clone(),
                });
            }
        }
        Notification::Sync(done) => {
            let _ = done.try_send(());
        }
    }
}
