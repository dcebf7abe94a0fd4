//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like passing a TID where a
//! core index is expected, and make function signatures more expressive.

// Tick-to-seconds conversions intentionally lose precision for display
#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of 100 ns ticks in one millisecond.
pub const TICKS_PER_MS: u64 = 10_000;

/// Thread ID
///
/// Represents a thread ID assigned by the kernel. This is distinct from
/// [`Pid`] - every thread of a process shares the process ID but carries
/// its own TID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tid(pub u32);

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

/// Process ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

/// Processor core index (0, 1, 2, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoreId(pub u32);

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU:{}", self.0)
    }
}

/// User ID owning a thread, taken from the capture's process catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid(pub u32);

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UID:{}", self.0)
    }
}

/// Timestamp in 100 ns ticks
///
/// Represents an absolute point in time on the capture's monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Elapsed ticks since `earlier`. Saturates at zero for defensively
    /// sorted but still-overlapping inputs.
    #[must_use]
    pub fn span_since(self, earlier: Timestamp) -> TickSpan {
        TickSpan(self.0.saturating_sub(earlier.0))
    }

    /// The timestamp `span` ticks after this one.
    #[must_use]
    pub fn advanced_by(self, span: TickSpan) -> Timestamp {
        Timestamp(self.0 + span.0)
    }

    /// Convert to seconds (f64)
    #[must_use]
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / (1_000.0 * TICKS_PER_MS as f64)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_seconds())
    }
}

/// A length of time in 100 ns ticks
///
/// Used for interval widths and accumulated occupancy durations.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TickSpan(pub u64);

impl TickSpan {
    /// A span of `ms` milliseconds.
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        TickSpan(ms * TICKS_PER_MS)
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// This span as a fraction of `whole` (0.0 when `whole` is zero).
    #[must_use]
    pub fn fraction_of(self, whole: TickSpan) -> f64 {
        if whole.0 == 0 {
            0.0
        } else {
            self.0 as f64 / whole.0 as f64
        }
    }
}

impl std::ops::Add for TickSpan {
    type Output = TickSpan;

    fn add(self, rhs: TickSpan) -> TickSpan {
        TickSpan(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for TickSpan {
    fn add_assign(&mut self, rhs: TickSpan) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for TickSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0 / TICKS_PER_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_since_saturates() {
        let a = Timestamp(100);
        let b = Timestamp(250);
        assert_eq!(b.span_since(a), TickSpan(150));
        assert_eq!(a.span_since(b), TickSpan(0));
    }

    #[test]
    fn test_tick_span_from_millis() {
        assert_eq!(TickSpan::from_millis(300), TickSpan(3_000_000));
    }

    #[test]
    fn test_fraction_of() {
        let part = TickSpan::from_millis(25);
        let whole = TickSpan::from_millis(100);
        assert!((part.fraction_of(whole) - 0.25).abs() < f64::EPSILON);
        assert!(part.fraction_of(TickSpan(0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Tid(42).to_string(), "TID:42");
        assert_eq!(CoreId(3).to_string(), "CPU:3");
        assert_eq!(TickSpan::from_millis(300).to_string(), "300ms");
    }
}
