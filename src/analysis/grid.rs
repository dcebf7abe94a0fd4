//! Frame grid assembly.
//!
//! [`build_frame_grid`] computes the analysis window (intersection of
//! the monitored process's lifetime with the counter stream's
//! coverage), partitions it into fixed-width windows and produces one
//! [`EventFrame`] per (window, core) cell. Cores are independent once
//! each owns its correlator, so every core's column of frames is
//! computed on its own scoped thread and the results are funneled back
//! over a channel, then interleaved into ascending (window, core)
//! order.

use super::aggregator::{partition_faults, partition_samples, CoreAggregator, Counters};
use super::correlator::{partition_switches, CoreCorrelator};
use super::{ThreadOccupancy, Window};
use crate::domain::{AnalysisError, CoreId, CorrelateError, TickSpan, Timestamp};
use crate::trace_data::{RecordedTrace, ThreadIdentity};
use crossbeam_channel::bounded;
use log::{debug, info, warn};
use std::collections::HashMap;

/// The occupancy/hardware summary for one (time window, core) cell.
#[derive(Debug, Clone)]
pub struct EventFrame {
    pub start_time: Timestamp,
    pub interval_width: TickSpan,
    pub core: CoreId,
    pub occupancy: HashMap<ThreadIdentity, TickSpan>,
    /// Always equals `interval_width`: silent windows resolve through
    /// carry-forward, never as under-counted frames.
    pub total_accumulated: TickSpan,
    pub counters: Counters,
}

/// The ordered frame sequence for one analysis run, plus the grid
/// geometry. Immutable once built.
#[derive(Debug)]
pub struct FrameStore {
    frames: Vec<EventFrame>,
    pub start: Timestamp,
    pub interval_width: TickSpan,
    pub window_count: usize,
    pub core_count: u32,
}

impl FrameStore {
    /// Frames in ascending (window index, core) order.
    #[must_use]
    pub fn frames(&self) -> &[EventFrame] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Assemble the full frame grid for the first process whose name starts
/// with `process_prefix`, using `interval_ms`-wide windows.
///
/// # Errors
/// - [`AnalysisError::ProcessNotFound`] when no process matches.
/// - [`AnalysisError::EmptyWindow`] when the counter stream is empty or
///   never overlaps the process lifetime.
///
/// # Panics
/// `interval_ms` must be positive (enforced at the CLI boundary).
pub fn build_frame_grid(
    trace: &RecordedTrace,
    process_prefix: &str,
    interval_ms: u64,
) -> Result<FrameStore, AnalysisError> {
    assert!(interval_ms > 0, "interval width must be positive");

    let process = trace
        .find_process(process_prefix)
        .ok_or_else(|| AnalysisError::ProcessNotFound { prefix: process_prefix.to_string() })?;

    let first_sample = trace.first_sample_time().ok_or(AnalysisError::EmptyWindow)?;
    let last_sample = trace.last_sample_time().ok_or(AnalysisError::EmptyWindow)?;
    let start = process.start.max(first_sample);
    let end = process.end.min(last_sample);
    if end <= start {
        return Err(AnalysisError::EmptyWindow);
    }

    let width = TickSpan::from_millis(interval_ms);
    let duration = end.span_since(start);
    let window_count = usize::try_from(duration.0.div_ceil(width.0)).unwrap_or(usize::MAX);
    let core_count = trace.core_count();

    info!(
        "analysis window [{start}, {end}]: {window_count} windows of {width} across {core_count} cores"
    );

    let switches = partition_switches(&trace.switches, core_count);
    let samples = partition_samples(&trace.samples, core_count);
    let faults = partition_faults(&trace.faults, process.pid, core_count);

    // One worker per core: the correlator's carry state is owned by the
    // worker, so nothing is shared across cores. Columns come back over
    // the channel in whatever order the workers finish.
    let (column_tx, column_rx) = bounded::<(u32, Vec<EventFrame>)>(core_count as usize);
    let mut columns: Vec<Vec<EventFrame>> = Vec::with_capacity(core_count as usize);
    std::thread::scope(|scope| {
        for core_index in 0..core_count {
            let tx = column_tx.clone();
            let core_switches = &switches[core_index as usize];
            let core_samples = &samples[core_index as usize];
            let core_faults = &faults[core_index as usize];
            scope.spawn(move || {
                let core = CoreId(core_index);
                let column = build_core_column(
                    core,
                    start,
                    width,
                    window_count,
                    CoreCorrelator::new(core, core_switches, process),
                    CoreAggregator::new(core, core_samples, core_faults),
                );
                // Receiver outlives the scope; send cannot fail.
                let _ = tx.send((core_index, column));
            });
        }
        drop(column_tx);

        let mut received: Vec<Option<Vec<EventFrame>>> = (0..core_count).map(|_| None).collect();
        for (core_index, column) in column_rx.iter().take(core_count as usize) {
            received[core_index as usize] = Some(column);
        }
        columns = received.into_iter().flatten().collect();
    });
    debug_assert_eq!(columns.len(), core_count as usize);

    // Interleave per-core columns into ascending (window, core) order;
    // exporters that group by time rely on it.
    let mut frames = Vec::with_capacity(window_count * core_count as usize);
    for window_index in 0..window_count {
        for column in &columns {
            frames.push(column[window_index].clone());
        }
    }

    debug!("assembled {} frames", frames.len());
    Ok(FrameStore { frames, start, interval_width: width, window_count, core_count })
}

/// Compute one core's full column of frames, windows strictly ascending
/// as the correlator's contract requires.
fn build_core_column(
    core: CoreId,
    grid_start: Timestamp,
    width: TickSpan,
    window_count: usize,
    mut correlator: CoreCorrelator<'_>,
    mut aggregator: CoreAggregator<'_>,
) -> Vec<EventFrame> {
    let mut column = Vec::with_capacity(window_count);
    for window_index in 0..window_count {
        let window = Window::at(grid_start, window_index, width);
        let occupancy = match correlator.correlate(window) {
            Ok(occupancy) => occupancy,
            Err(CorrelateError::NoPriorState(core)) => {
                // Legitimately unanalyzable window: the run starts cold
                // on this core. Charge the synthetic unknown thread
                // rather than emitting an under-counted frame.
                warn!("{core}: no switch history before window {window_index}; charging <unknown>");
                ThreadOccupancy::full_window(ThreadIdentity::unknown(), width)
            }
        };
        let counters = aggregator.aggregate(window);
        column.push(EventFrame {
            start_time: window.start,
            interval_width: width,
            core,
            occupancy: occupancy.by_thread,
            total_accumulated: occupancy.total,
            counters,
        });
    }
    column
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Pid, Tid, Uid, TICKS_PER_MS};
    use crate::trace_data::{
        ContextSwitch, CounterSample, ProcessRecord, ThreadRecord, ThreadState,
    };

    fn trace_with(duration_ms: u64) -> RecordedTrace {
        let process = ProcessRecord {
            name: "my-server".to_string(),
            pid: Pid(100),
            start: Timestamp(0),
            end: Timestamp(duration_ms * TICKS_PER_MS),
            threads: vec![ThreadRecord {
                tid: Tid(101),
                name: "main".to_string(),
                user: "alice".to_string(),
                uid: Uid(500),
            }],
        };
        let sample = |ts: u64| CounterSample {
            timestamp: Timestamp(ts),
            core: CoreId(0),
            ipc: 1.5,
            l2_hits: 1,
            l2_misses: 1,
            l3_hits: 1,
            l3_misses: 1,
            l2_clock: 1.0,
            l3_clock: 1.0,
        };
        RecordedTrace {
            processes: vec![process],
            switches: vec![ContextSwitch {
                timestamp: Timestamp(0),
                core: CoreId(0),
                old_tid: Tid(0),
                old_pid: Pid(0),
                new_tid: Tid(101),
                new_pid: Pid(100),
                resulting_state: ThreadState::Running,
            }],
            samples: vec![sample(0), sample(duration_ms * TICKS_PER_MS)],
            faults: vec![],
        }
    }

    #[test]
    fn test_window_count_is_ceiling_of_duration_over_width() {
        // 1000ms of overlap at 300ms intervals -> 4 windows, the last
        // one nominally spanning past the end of the range.
        let store = build_frame_grid(&trace_with(1_000), "my-", 300).unwrap();
        assert_eq!(store.window_count, 4);
        assert_eq!(store.len(), 4);
        let last = &store.frames()[3];
        assert_eq!(last.interval_width, TickSpan::from_millis(300));
        assert_eq!(last.total_accumulated, TickSpan::from_millis(300));
    }

    #[test]
    fn test_process_not_found() {
        let err = build_frame_grid(&trace_with(1_000), "no-such", 100).unwrap_err();
        assert!(matches!(err, AnalysisError::ProcessNotFound { .. }));
    }

    #[test]
    fn test_empty_counter_stream_is_empty_window() {
        let mut trace = trace_with(1_000);
        trace.samples.clear();
        let err = build_frame_grid(&trace, "my-", 100).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyWindow));
    }

    #[test]
    fn test_disjoint_ranges_are_empty_window() {
        let mut trace = trace_with(1_000);
        // Counter coverage entirely after the process ended.
        for sample in &mut trace.samples {
            sample.timestamp = Timestamp(sample.timestamp.0 + 100_000 * TICKS_PER_MS);
        }
        let err = build_frame_grid(&trace, "my-", 100).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyWindow));
    }

    #[test]
    fn test_frames_ascend_by_window_then_core() {
        let mut trace = trace_with(1_000);
        // A second core observed only in the sample stream.
        let mut extra = trace.samples[0];
        extra.core = CoreId(1);
        trace.samples.push(extra);
        trace.sort_streams();

        let store = build_frame_grid(&trace, "my-", 500).unwrap();
        assert_eq!(store.core_count, 2);
        let order: Vec<(Timestamp, CoreId)> =
            store.frames().iter().map(|f| (f.start_time, f.core)).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_every_frame_accumulates_exactly_one_width() {
        let store = build_frame_grid(&trace_with(1_000), "my-", 300).unwrap();
        for frame in store.frames() {
            assert_eq!(frame.total_accumulated, frame.interval_width);
            let sum: u64 = frame.occupancy.values().map(|s| s.0).sum();
            assert_eq!(TickSpan(sum), frame.interval_width);
        }
    }
}
