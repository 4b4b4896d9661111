//! Network table store - entries, reconciliation, listener dispatch
//!
//! This crate implements the synchronization core:
//! - The name-indexed entry table
//! - The single-lock mutation protocol
//! - Last-writer-wins reconciliation by sequence number
//! - Listener registry and queued, lock-free-at-delivery dispatch

pub mod notify;
pub mod store;
pub mod table;

pub use notify::*;
pub use store::*;
pub use table::*;
