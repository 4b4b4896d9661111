//! Error types for the network table

use thiserror::Error;

/// Table errors
///
/// Deliberately small: stale updates, unknown names on delete/flag ops,
/// and unknown listener/call ids are silent no-ops, not errors. Malformed
/// persistence lines are reported through the load warning callback.
#[derive(Error, Debug)]
pub enum TableError {
    // Persistence errors
    #[error("persistent stream error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad persistent file header: {0}")]
    PersistHeader(String),
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
