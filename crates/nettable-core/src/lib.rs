//! Network table core - fundamental types
//!
//! This crate defines the types shared by every layer of the table:
//! - Values and value kinds
//! - Entries, entry flags, and enumeration snapshots
//! - Listener events and masks
//! - Connection descriptions
//! - Opaque listener/call identifiers

pub mod entry;
pub mod error;
pub mod event;
pub mod id;
pub mod value;

pub use entry::*;
pub use error::*;
pub use event::*;
pub use id::*;
pub use value::*;
