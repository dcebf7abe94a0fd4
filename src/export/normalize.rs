//! Flatten the frame grid into (kind, subject, time, value) tuples.
//!
//! Each frame yields one tuple per thread with non-zero occupancy
//! (value = occupancy as a fraction of the interval width) plus one
//! tuple per hardware/fault metric under the synthetic `<system>`
//! subject. Exporters consume only this sequence.

use crate::analysis::{Counters, EventFrame, FrameStore};
use crate::domain::{CoreId, Pid, Tid, Timestamp, Uid};
use crate::trace_data::ThreadIdentity;
use serde::Serialize;

/// What a tuple's `value` measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Fraction of the window a thread occupied the core, in [0, 1].
    CpuOccupancy,
    Ipc,
    L1Misses,
    L2Hits,
    L2Misses,
    L3Hits,
    L3Misses,
    L2Clock,
    L3Clock,
    MinorPageFaults,
    MajorPageFaults,
}

impl MetricKind {
    /// The core-scoped kinds emitted once per frame, in output order.
    pub const CORE_SCOPED: [MetricKind; 10] = [
        MetricKind::Ipc,
        MetricKind::L1Misses,
        MetricKind::L2Hits,
        MetricKind::L2Misses,
        MetricKind::L3Hits,
        MetricKind::L3Misses,
        MetricKind::L2Clock,
        MetricKind::L3Clock,
        MetricKind::MinorPageFaults,
        MetricKind::MajorPageFaults,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::CpuOccupancy => "cpu_occupancy",
            MetricKind::Ipc => "ipc",
            MetricKind::L1Misses => "l1_misses",
            MetricKind::L2Hits => "l2_hits",
            MetricKind::L2Misses => "l2_misses",
            MetricKind::L3Hits => "l3_hits",
            MetricKind::L3Misses => "l3_misses",
            MetricKind::L2Clock => "l2_clock",
            MetricKind::L3Clock => "l3_clock",
            MetricKind::MinorPageFaults => "minor_page_faults",
            MetricKind::MajorPageFaults => "major_page_faults",
        }
    }
}

/// One flat measurement: subject, window start time, metric, value.
#[derive(Debug, Clone, Serialize)]
pub struct MetricTuple {
    pub kind: MetricKind,
    pub process_name: String,
    pub user: String,
    /// Window start, in ticks.
    pub timestamp: Timestamp,
    pub value: f64,
    pub tid: Tid,
    pub pid: Pid,
    pub core: CoreId,
    pub uid: Uid,
}

// Counter totals intentionally convert to f64 for the uniform value field
#[allow(clippy::cast_precision_loss)]
fn counter_value(counters: &Counters, kind: MetricKind) -> f64 {
    match kind {
        MetricKind::CpuOccupancy => 0.0,
        MetricKind::Ipc => counters.ipc,
        MetricKind::L1Misses => counters.l1_misses as f64,
        MetricKind::L2Hits => counters.l2_hits as f64,
        MetricKind::L2Misses => counters.l2_misses as f64,
        MetricKind::L3Hits => counters.l3_hits as f64,
        MetricKind::L3Misses => counters.l3_misses as f64,
        MetricKind::L2Clock => counters.l2_clock,
        MetricKind::L3Clock => counters.l3_clock,
        MetricKind::MinorPageFaults => counters.minor_page_faults as f64,
        MetricKind::MajorPageFaults => counters.major_page_faults as f64,
    }
}

fn flatten_frame(frame: &EventFrame, out: &mut Vec<MetricTuple>) {
    // Occupancy map order is unspecified; sort by subject so the output
    // is deterministic run to run.
    let mut entries: Vec<(&ThreadIdentity, _)> = frame.occupancy.iter().collect();
    entries.sort_by_key(|(identity, _)| (identity.tid, identity.pid));
    for (identity, span) in entries {
        if span.is_zero() {
            continue;
        }
        out.push(MetricTuple {
            kind: MetricKind::CpuOccupancy,
            process_name: identity.process_name.clone(),
            user: identity.user.clone(),
            timestamp: frame.start_time,
            value: span.fraction_of(frame.interval_width),
            tid: identity.tid,
            pid: identity.pid,
            core: frame.core,
            uid: identity.uid,
        });
    }

    let system = ThreadIdentity::system();
    for kind in MetricKind::CORE_SCOPED {
        out.push(MetricTuple {
            kind,
            process_name: system.process_name.clone(),
            user: system.user.clone(),
            timestamp: frame.start_time,
            value: counter_value(&frame.counters, kind),
            tid: system.tid,
            pid: system.pid,
            core: frame.core,
            uid: system.uid,
        });
    }
}

/// Flatten a whole frame store, frame order preserved.
#[must_use]
pub fn flatten_frames(store: &FrameStore) -> Vec<MetricTuple> {
    let mut tuples = Vec::with_capacity(store.len() * (MetricKind::CORE_SCOPED.len() + 2));
    for frame in store.frames() {
        flatten_frame(frame, &mut tuples);
    }
    tuples
}
