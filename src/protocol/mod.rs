//! Protocol module for evaluation runs.
//!
//! Provides the explicit logger value handed to windowing and evaluation,
//! replacing any process-wide logging state.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, ProtocolLog, ProtocolStats, SharedProtocolLog};
