//! CSV exporters.
//!
//! Two shapes over the same tuple sequence: a flat table with one row
//! per tuple, and a per-subject pivot with one column per window.

use super::normalize::{MetricKind, MetricTuple};
use crate::domain::{ExportError, Tid, Timestamp};
use std::collections::BTreeMap;
use std::io::Write;

/// Write one row per tuple with a fixed header.
///
/// # Errors
/// Propagates writer failures.
pub fn write_flat_csv<W: Write>(mut writer: W, tuples: &[MetricTuple]) -> Result<(), ExportError> {
    writeln!(writer, "kind,process,user,timestamp,value,tid,pid,core,uid")?;
    for t in tuples {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{}",
            t.kind.as_str(),
            t.process_name,
            t.user,
            t.timestamp.0,
            t.value,
            t.tid.0,
            t.pid.0,
            t.core.0,
            t.uid.0
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a time-pivoted table: one row per (subject tid, metric kind),
/// one value column per window timestamp. A subject that appears on
/// several cores in the same window has its values summed.
///
/// # Errors
/// Propagates writer failures.
pub fn write_pivot_csv<W: Write>(mut writer: W, tuples: &[MetricTuple]) -> Result<(), ExportError> {
    let mut timestamps: Vec<Timestamp> = tuples.iter().map(|t| t.timestamp).collect();
    timestamps.sort_unstable();
    timestamps.dedup();

    // (tid, kind) -> timestamp -> summed value
    let mut rows: BTreeMap<(Tid, MetricKind), BTreeMap<Timestamp, f64>> = BTreeMap::new();
    for t in tuples {
        *rows.entry((t.tid, t.kind)).or_default().entry(t.timestamp).or_insert(0.0) += t.value;
    }

    write!(writer, "tid,kind")?;
    for ts in &timestamps {
        write!(writer, ",{}", ts.0)?;
    }
    writeln!(writer)?;

    for ((tid, kind), cells) in &rows {
        write!(writer, "{},{}", tid.0, kind.as_str())?;
        for ts in &timestamps {
            match cells.get(ts) {
                Some(value) => write!(writer, ",{value}")?,
                None => write!(writer, ",")?,
            }
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
