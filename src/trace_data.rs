//! Recorded-trace data models
//!
//! This module contains the read-only view over a finished capture: the
//! process/thread catalog, the scheduler event stream (context switches
//! and page faults) and the hardware counter stream. The capture format
//! itself belongs to the external tracing tool; this is only the thin
//! serde model the analysis borrows its inputs from.

use crate::domain::{CoreId, Pid, Tid, Timestamp, TraceError, Uid};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thread state after a context switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadState {
    Running,
    Waiting,
    Other,
}

/// One scheduler context-switch record: `core` stopped running the old
/// thread and started running the new one at `timestamp`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContextSwitch {
    pub timestamp: Timestamp,
    pub core: CoreId,
    pub old_tid: Tid,
    pub old_pid: Pid,
    pub new_tid: Tid,
    pub new_pid: Pid,
    pub resulting_state: ThreadState,
}

/// One hardware counter sample for a single core.
///
/// The capture records one pair of cache hit/miss counters per level;
/// samples for different cores at the same timestamp are independent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CounterSample {
    pub timestamp: Timestamp,
    pub core: CoreId,
    pub ipc: f64,
    pub l2_hits: u64,
    pub l2_misses: u64,
    pub l3_hits: u64,
    pub l3_misses: u64,
    pub l2_clock: f64,
    pub l3_clock: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    Minor,
    Major,
}

/// One page-fault record from the scheduler event stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageFault {
    pub timestamp: Timestamp,
    pub core: CoreId,
    pub pid: Pid,
    pub kind: FaultKind,
}

/// Catalog entry for one thread of a recorded process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub tid: Tid,
    pub name: String,
    pub user: String,
    pub uid: Uid,
}

/// Catalog entry for one recorded process and its thread table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub name: String,
    pub pid: Pid,
    pub start: Timestamp,
    pub end: Timestamp,
    pub threads: Vec<ThreadRecord>,
}

/// Resolved thread identity attached to every occupancy entry.
///
/// Lookup against the monitored process's thread table either succeeds
/// (full identity) or degrades to a placeholder carrying the raw ids -
/// no event is ever dropped for referencing an id outside the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ThreadIdentity {
    pub tid: Tid,
    pub pid: Pid,
    pub process_name: String,
    pub user: String,
    pub uid: Uid,
}

impl ThreadIdentity {
    /// Subject name of the cold-start identity; no real process can
    /// carry it since catalog names never contain angle brackets.
    pub const UNKNOWN_NAME: &'static str = "<unknown>";
    /// Subject name of the core-scoped metrics identity.
    pub const SYSTEM_NAME: &'static str = "<system>";

    /// Synthetic identity charged for windows on a core that has no
    /// switch history yet (cold start).
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            tid: Tid(0),
            pid: Pid(0),
            process_name: Self::UNKNOWN_NAME.to_string(),
            user: Self::UNKNOWN_NAME.to_string(),
            uid: Uid(0),
        }
    }

    /// Synthetic subject for core-scoped hardware and fault metrics
    /// that belong to no specific thread.
    #[must_use]
    pub fn system() -> Self {
        Self {
            tid: Tid(0),
            pid: Pid(0),
            process_name: Self::SYSTEM_NAME.to_string(),
            user: Self::SYSTEM_NAME.to_string(),
            uid: Uid(0),
        }
    }
}

impl ProcessRecord {
    /// Resolve a (tid, pid) pair seen in the switch stream against this
    /// process's thread table. Ids outside the table still produce an
    /// identity carrying the raw ids.
    #[must_use]
    pub fn resolve_thread(&self, tid: Tid, pid: Pid) -> ThreadIdentity {
        if pid == self.pid {
            if let Some(t) = self.threads.iter().find(|t| t.tid == tid) {
                return ThreadIdentity {
                    tid,
                    pid,
                    process_name: self.name.clone(),
                    user: t.user.clone(),
                    uid: t.uid,
                };
            }
        }
        ThreadIdentity {
            tid,
            pid,
            process_name: "<unresolved>".to_string(),
            user: "<unresolved>".to_string(),
            uid: Uid(0),
        }
    }
}

/// Immutable in-memory view of one finished capture.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecordedTrace {
    pub processes: Vec<ProcessRecord>,
    pub switches: Vec<ContextSwitch>,
    pub samples: Vec<CounterSample>,
    pub faults: Vec<PageFault>,
}

impl RecordedTrace {
    /// Load a capture file into our internal representation.
    ///
    /// # Errors
    /// Returns [`TraceError`] when the file is unreadable or not valid
    /// capture JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let content = std::fs::read_to_string(path)?;
        let mut trace: RecordedTrace = serde_json::from_str(&content)?;
        trace.validate()?;
        trace.sort_streams();
        Ok(trace)
    }

    /// Structural sanity checks on the catalog. Out-of-order event
    /// streams are tolerated (and sorted), but a process whose lifetime
    /// is inverted can never yield a meaningful analysis window.
    fn validate(&self) -> Result<(), TraceError> {
        if let Some(p) = self.processes.iter().find(|p| p.end < p.start) {
            return Err(TraceError::InvalidTraceData(format!(
                "process \"{}\" ends at {} before it starts at {}",
                p.name, p.end, p.start
            )));
        }
        Ok(())
    }

    /// Per-core timestamps are supposed to be non-decreasing in capture
    /// order; sort defensively since correlation relies on it. Stable
    /// sorts keep capture order for identical timestamps, which the
    /// correlator's tie-break depends on.
    pub fn sort_streams(&mut self) {
        self.switches.sort_by_key(|s| (s.core, s.timestamp));
        self.samples.sort_by_key(|s| (s.core, s.timestamp));
        self.faults.sort_by_key(|f| (f.core, f.timestamp));
    }

    /// First process whose name starts with `prefix`.
    #[must_use]
    pub fn find_process(&self, prefix: &str) -> Option<&ProcessRecord> {
        self.processes.iter().find(|p| p.name.starts_with(prefix))
    }

    /// Earliest counter-sample timestamp across all cores.
    #[must_use]
    pub fn first_sample_time(&self) -> Option<Timestamp> {
        self.samples.iter().map(|s| s.timestamp).min()
    }

    /// Latest counter-sample timestamp across all cores.
    #[must_use]
    pub fn last_sample_time(&self) -> Option<Timestamp> {
        self.samples.iter().map(|s| s.timestamp).max()
    }

    /// Number of cores covered by the capture: one past the highest
    /// core index observed in either stream. The capture header carries
    /// no core count of its own.
    #[must_use]
    pub fn core_count(&self) -> u32 {
        let max_switch = self.switches.iter().map(|s| s.core.0).max();
        let max_sample = self.samples.iter().map(|s| s.core.0).max();
        match (max_switch, max_sample) {
            (Some(a), Some(b)) => a.max(b) + 1,
            (Some(a), None) | (None, Some(a)) => a + 1,
            (None, None) => 0,
        }
    }
}
