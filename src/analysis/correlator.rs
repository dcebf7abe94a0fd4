//! Context-switch correlation for a single core.
//!
//! [`CoreCorrelator`] walks one core's switch stream window by window
//! and charges each thread with the time it occupied the core. The
//! tricky case is a *silent* window - one with no observed switch - which
//! must never produce an empty frame: the thread known to be running as
//! of the most recent switch in any earlier window is charged with the
//! whole width instead (carry-forward).
//!
//! # Contract
//!
//! Windows must be presented in ascending time order; the carry state
//! is owned by this value and advances as a side effect of each call.
//! One correlator serves exactly one core, so different cores can be
//! correlated on different threads without sharing anything.

use super::Window;
use crate::domain::{CoreId, CorrelateError, Pid, TickSpan, Tid};
use crate::trace_data::{ContextSwitch, ProcessRecord, ThreadIdentity};
use std::collections::HashMap;

/// Per-thread occupancy for one (window, core) cell.
#[derive(Debug, Clone)]
pub struct ThreadOccupancy {
    /// Accumulated run time per thread. Covers every thread observed
    /// switching in the window plus the carried-forward thread;
    /// zero-length charges keep their entry.
    pub by_thread: HashMap<ThreadIdentity, TickSpan>,
    /// Sum of all charges; equals the window width by construction.
    pub total: TickSpan,
}

impl ThreadOccupancy {
    fn new() -> Self {
        Self { by_thread: HashMap::new(), total: TickSpan(0) }
    }

    /// The entire window charged to one thread (silent-window path).
    #[must_use]
    pub fn full_window(identity: ThreadIdentity, width: TickSpan) -> Self {
        let mut occupancy = Self::new();
        occupancy.charge(identity, width);
        occupancy
    }

    fn charge(&mut self, identity: ThreadIdentity, elapsed: TickSpan) {
        *self.by_thread.entry(identity).or_default() += elapsed;
        self.total += elapsed;
    }
}

/// Last known running thread on a core, threaded explicitly through the
/// window walk instead of living in shared run-wide state.
#[derive(Debug, Clone, Copy)]
enum CarryState {
    /// No switch observed on this core yet.
    Cold,
    /// The core started cold and a silent window already surfaced
    /// [`CorrelateError::NoPriorState`]; later silent windows resolve
    /// to the synthetic unknown thread without erroring again.
    Unknown,
    /// The thread the most recent switch handed the core to.
    Running { tid: Tid, pid: Pid },
}

/// Stateful per-core correlator. See the module docs for the ordering
/// contract.
pub struct CoreCorrelator<'a> {
    core: CoreId,
    /// This core's switches, ascending by timestamp (stable for ties).
    switches: &'a [ContextSwitch],
    process: &'a ProcessRecord,
    carry: CarryState,
    /// Index of the first switch not yet behind the current window.
    /// Never rewinds; boundary switches stay visible to the next window
    /// because the cursor only skips timestamps strictly before it.
    cursor: usize,
}

impl<'a> CoreCorrelator<'a> {
    #[must_use]
    pub fn new(core: CoreId, switches: &'a [ContextSwitch], process: &'a ProcessRecord) -> Self {
        debug_assert!(switches.iter().all(|s| s.core == core));
        Self { core, switches, process, carry: CarryState::Cold, cursor: 0 }
    }

    /// Resolve per-thread occupancy for `window`.
    ///
    /// # Errors
    /// [`CorrelateError::NoPriorState`] for the first silent window on a
    /// core that has never seen a switch. The caller is expected to emit
    /// a full-width [`ThreadIdentity::unknown`] occupancy in that case;
    /// subsequent silent windows resolve to it without erroring.
    pub fn correlate(&mut self, window: Window) -> Result<ThreadOccupancy, CorrelateError> {
        let switches = self.switches;
        // Switches behind the window still advance the carry: one that
        // happened before the grid even starts is exactly the "most
        // recent switch in any earlier window" silent windows fall back
        // to.
        while self.cursor < switches.len() && switches[self.cursor].timestamp < window.start {
            let behind = &switches[self.cursor];
            self.carry = CarryState::Running { tid: behind.new_tid, pid: behind.new_pid };
            self.cursor += 1;
        }
        let mut hi = self.cursor;
        while hi < switches.len() && switches[hi].timestamp <= window.end {
            hi += 1;
        }
        let in_window = &switches[self.cursor..hi];

        if in_window.is_empty() {
            return self.resolve_silent(window);
        }

        let mut occupancy = ThreadOccupancy::new();
        let mut boundary = window.start;
        for switch in in_window {
            // The switch's old thread is the one that ran since the
            // previous boundary. Identical timestamps charge zero-length
            // intervals in capture order.
            let elapsed = switch.timestamp.span_since(boundary);
            occupancy.charge(self.resolve(switch.old_tid, switch.old_pid), elapsed);
            boundary = switch.timestamp;
        }
        // Tail of the window belongs to whoever the last switch
        // installed; that switch also becomes the carry for later
        // silent windows.
        let last = &in_window[in_window.len() - 1];
        occupancy.charge(self.resolve(last.new_tid, last.new_pid), window.end.span_since(boundary));
        self.carry = CarryState::Running { tid: last.new_tid, pid: last.new_pid };

        debug_assert_eq!(occupancy.total, window.width);
        Ok(occupancy)
    }

    fn resolve_silent(&mut self, window: Window) -> Result<ThreadOccupancy, CorrelateError> {
        match self.carry {
            CarryState::Cold => {
                self.carry = CarryState::Unknown;
                Err(CorrelateError::NoPriorState(self.core))
            }
            CarryState::Unknown => {
                Ok(ThreadOccupancy::full_window(ThreadIdentity::unknown(), window.width))
            }
            CarryState::Running { tid, pid } => {
                Ok(ThreadOccupancy::full_window(self.resolve(tid, pid), window.width))
            }
        }
    }

    fn resolve(&self, tid: Tid, pid: Pid) -> ThreadIdentity {
        self.process.resolve_thread(tid, pid)
    }

    /// The thread the most recent observed switch handed the core to,
    /// if any. Used by tests to pin down carry behavior.
    #[must_use]
    pub fn last_known(&self) -> Option<(Tid, Pid)> {
        match self.carry {
            CarryState::Running { tid, pid } => Some((tid, pid)),
            CarryState::Cold | CarryState::Unknown => None,
        }
    }
}

/// Split the full switch list into per-core vectors, capture order
/// preserved within each core.
#[must_use]
pub fn partition_switches(switches: &[ContextSwitch], core_count: u32) -> Vec<Vec<ContextSwitch>> {
    let mut per_core: Vec<Vec<ContextSwitch>> = vec![Vec::new(); core_count as usize];
    for switch in switches {
        if let Some(bucket) = per_core.get_mut(switch.core.0 as usize) {
            bucket.push(*switch);
        }
    }
    per_core
}
