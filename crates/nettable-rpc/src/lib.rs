//! Network table RPC - invocation correlation and procedure definitions

pub mod correlator;
pub mod define;

pub use correlator::*;
pub use define::*;
