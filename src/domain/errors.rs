//! Structured error types for framescope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::CoreId;
use thiserror::Error;

/// Structural failures of a whole analysis run. No partial result is
/// meaningful once one of these fires, so the run aborts.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No process matching prefix \"{prefix}\" found in trace")]
    ProcessNotFound { prefix: String },

    #[error("Process lifetime and counter stream never overlap (or counter stream is empty)")]
    EmptyWindow,
}

/// Per-window correlation anomalies. These are recoverable: the grid
/// builder compensates instead of aborting the run.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelateError {
    #[error("No context switch ever observed on {0} before a window that needs carry-forward")]
    NoPriorState(CoreId),
}

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Invalid trace data: {0}")]
    InvalidTraceData(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
