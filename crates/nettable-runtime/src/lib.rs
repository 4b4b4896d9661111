//! Network table runtime - the instance facade
//!
//! Ties the store, dispatcher, persistence codec, and RPC correlator into
//! one handle, and defines the boundary the transport layer drains and
//! feeds: outbound update queue in, ordered per-peer updates and
//! connect/disconnect records back.

pub mod instance;
pub mod transport;

pub use instance::*;
pub use transport::*;
