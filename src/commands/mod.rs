//! Command implementations
//!
//! Each module corresponds to an action of the CLI.

pub mod send;

// Re-export commonly used types
pub use send::{dry_run, run as send_run};
