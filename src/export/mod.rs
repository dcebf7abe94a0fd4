//! Frame export functionality
//!
//! The frame store's only outward interface is the flat metric-tuple
//! sequence produced by [`normalize`]; the CSV and JSON exporters
//! consume nothing but that sequence.

pub mod csv;
pub mod json_chart;
pub mod normalize;

pub use csv::{write_flat_csv, write_pivot_csv};
pub use json_chart::write_json_chart;
pub use normalize::{flatten_frames, MetricKind, MetricTuple};
