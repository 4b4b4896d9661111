//! Network table persistence - line-oriented text codec
//!
//! Save writes the Persistent-flagged subset of the table, name-sorted
//! and deterministic. Load is tolerant: each malformed line is reported
//! through a warning callback and skipped, and only a stream-level
//! failure aborts.

pub mod escape;
pub mod load;
pub mod save;

pub use escape::*;
pub use load::*;
pub use save::*;
