//! # framescope - Scheduler/Counter Trace Correlation
//!
//! framescope turns two independently-sampled time series from a
//! recorded capture of a running program - a scheduler event stream
//! (context switches, page faults) and a per-core hardware counter
//! stream (IPC, cache hits/misses) - into a single regular-interval
//! grid of *frames* that downstream tooling can chart or export.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Recorded capture (JSON)                 │
//! │   process catalog · context switches · counter samples   │
//! └───────────────────────────┬──────────────────────────────┘
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  framescope (This Crate)                 │
//! │                                                          │
//! │  ┌────────────┐    ┌─────────────────────────────────┐  │
//! │  │ trace_data │───▶│ analysis                        │  │
//! │  │  (loader)  │    │  grid ── correlator/aggregator  │  │
//! │  └────────────┘    └───────────────┬─────────────────┘  │
//! │                                    ▼                     │
//! │                    ┌─────────────────────────────────┐  │
//! │                    │ export                          │  │
//! │                    │  normalize ── csv / json_chart  │  │
//! │                    └─────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`trace_data`]: read-only serde model of one finished capture
//!   (process/thread catalog, switch, sample and fault streams)
//!
//! - [`analysis`]: the correlation engine
//!   - `grid`: analysis-window math, the (window × core) pass, and the
//!     immutable [`analysis::FrameStore`] it produces
//!   - `correlator`: per-thread occupancy per cell, including the
//!     carry-forward resolution of windows with no observed switch
//!   - `aggregator`: per-cell reduction of counter samples and
//!     page-fault counts
//!
//! - [`export`]: flatten frames into (kind, subject, time, value)
//!   tuples and serialize them as flat CSV, pivoted CSV or a JSON chart
//!   payload
//!
//! - [`cli`]: command-line argument parsing
//!
//! - [`domain`]: core domain types (Tid, Pid, CoreId, Timestamp) and
//!   structured errors
//!
//! ## Key Concepts
//!
//! - **Frame**: the occupancy/hardware summary for one (window, core)
//!   cell; every frame accounts for exactly one interval width of time.
//! - **Carry-forward**: a window with no observed switch charges its
//!   whole width to the thread the core was last known to be running.
//! - **Occupancy**: fraction of a window a given thread was the one
//!   running on a given core.
//!
//! ## Typical Usage
//!
//! ```bash
//! # 100ms frames for the process whose name starts with "my-server"
//! framescope capture.json -p my-server -i 100
//!
//! # Chart payload for the same run
//! framescope capture.json -p my-server -i 100 --format json -o chart.json
//! ```

pub mod analysis;
pub mod cli;
pub mod domain;
pub mod export;
pub mod trace_data;
