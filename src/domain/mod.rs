//! Domain model for framescope
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - Self-documenting function signatures
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{CoreId, Pid, TickSpan, Tid, Timestamp, Uid, TICKS_PER_MS};

pub use errors::{AnalysisError, CorrelateError, ExportError, TraceError};
