//! Frame assembly: the correlation engine.
//!
//! One pass over the (window × core) grid: for each cell the
//! [`correlator`] resolves per-thread occupancy from the context-switch
//! stream and the [`aggregator`] reduces the coincident hardware
//! counter samples, producing one [`grid::EventFrame`].

pub mod aggregator;
pub mod correlator;
pub mod grid;

pub use aggregator::{CoreAggregator, Counters};
pub use correlator::{CoreCorrelator, ThreadOccupancy};
pub use grid::{build_frame_grid, EventFrame, FrameStore};

use crate::domain::{TickSpan, Timestamp};

/// One cell's time window.
///
/// `end` is `start + width`; both stream filters include both edges, so
/// a record sitting exactly on a shared edge lands in two adjacent
/// windows (a deliberate, bounded inaccuracy of the sampling design).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Timestamp,
    pub end: Timestamp,
    pub width: TickSpan,
}

impl Window {
    /// The `index`-th window of a grid starting at `grid_start`.
    #[must_use]
    pub fn at(grid_start: Timestamp, index: usize, width: TickSpan) -> Self {
        let start = grid_start.advanced_by(TickSpan(width.0 * index as u64));
        Window { start, end: start.advanced_by(width), width }
    }

    #[must_use]
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts <= self.end
    }
}
