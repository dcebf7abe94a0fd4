//! JSON chart payload exporter.
//!
//! Produces an object keyed by thread id with one series per metric
//! kind, ready for charting: occupancy is scaled to percent, every
//! series value is capped to [0, 100] and rounded to two decimals.

use super::normalize::{MetricKind, MetricTuple};
use crate::domain::ExportError;
use crate::trace_data::ThreadIdentity;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Debug, Serialize, PartialEq)]
struct ChartPoint {
    /// Window start, in ticks.
    t: u64,
    v: f64,
}

#[derive(Debug, Serialize)]
struct ThreadChart {
    process: String,
    user: String,
    series: BTreeMap<&'static str, Vec<ChartPoint>>,
}

fn chart_value(kind: MetricKind, value: f64) -> f64 {
    let scaled = match kind {
        MetricKind::CpuOccupancy => value * 100.0,
        _ => value,
    };
    (scaled.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

/// Payload key for one tuple's subject. Real threads key by tid; the
/// synthetic subjects all carry tid 0, so they key by name instead
/// (core-suffixed, since they are core-scoped) to keep them from
/// colliding with each other under `"0"`.
fn chart_key(t: &MetricTuple) -> String {
    match t.process_name.as_str() {
        ThreadIdentity::SYSTEM_NAME => format!("system:cpu{}", t.core.0),
        ThreadIdentity::UNKNOWN_NAME => format!("unknown:cpu{}", t.core.0),
        _ => t.tid.0.to_string(),
    }
}

/// Serialize the chart payload for the given tuple sequence.
///
/// # Errors
/// Propagates writer and serialization failures.
pub fn write_json_chart<W: Write>(
    mut writer: W,
    tuples: &[MetricTuple],
) -> Result<(), ExportError> {
    let mut charts: BTreeMap<String, ThreadChart> = BTreeMap::new();
    for t in tuples {
        let chart = charts.entry(chart_key(t)).or_insert_with(|| ThreadChart {
            process: t.process_name.clone(),
            user: t.user.clone(),
            series: BTreeMap::new(),
        });
        chart
            .series
            .entry(t.kind.as_str())
            .or_default()
            .push(ChartPoint { t: t.timestamp.0, v: chart_value(t.kind, t.value) });
    }

    serde_json::to_writer_pretty(&mut writer, &charts)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CoreId, Pid, Tid, Timestamp, Uid};

    fn tuple(kind: MetricKind, tid: u32, ts: u64, value: f64) -> MetricTuple {
        MetricTuple {
            kind,
            process_name: "my-server".to_string(),
            user: "alice".to_string(),
            timestamp: Timestamp(ts),
            value,
            tid: Tid(tid),
            pid: Pid(100),
            core: CoreId(0),
            uid: Uid(500),
        }
    }

    #[test]
    fn test_chart_value_scales_caps_and_rounds() {
        assert!((chart_value(MetricKind::CpuOccupancy, 0.4231) - 42.31).abs() < 1e-9);
        assert!((chart_value(MetricKind::CpuOccupancy, 1.5) - 100.0).abs() < 1e-9);
        assert!((chart_value(MetricKind::Ipc, 1.23456) - 1.23).abs() < 1e-9);
        assert!((chart_value(MetricKind::L2Hits, 1e9) - 100.0).abs() < 1e-9);
        assert!(chart_value(MetricKind::Ipc, -3.0).abs() < 1e-9);
    }

    fn system_tuple(kind: MetricKind, core: u32, ts: u64, value: f64) -> MetricTuple {
        let system = ThreadIdentity::system();
        MetricTuple {
            kind,
            process_name: system.process_name,
            user: system.user,
            timestamp: Timestamp(ts),
            value,
            tid: system.tid,
            pid: system.pid,
            core: CoreId(core),
            uid: system.uid,
        }
    }

    #[test]
    fn test_payload_keyed_by_tid_with_series() {
        let tuples = vec![
            tuple(MetricKind::CpuOccupancy, 101, 0, 0.5),
            tuple(MetricKind::CpuOccupancy, 101, 1_000, 0.25),
            system_tuple(MetricKind::Ipc, 0, 0, 1.2),
        ];
        let mut out = Vec::new();
        write_json_chart(&mut out, &tuples).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let series = &json["101"]["series"]["cpu_occupancy"];
        assert_eq!(series.as_array().unwrap().len(), 2);
        assert!((series[0]["v"].as_f64().unwrap() - 50.0).abs() < 1e-9);
        assert!((series[1]["v"].as_f64().unwrap() - 25.0).abs() < 1e-9);
        let ipc = &json["system:cpu0"]["series"]["ipc"];
        assert!((ipc[0]["v"].as_f64().unwrap() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_synthetic_subjects_do_not_collide() {
        // Both synthetic subjects carry tid 0: the system metrics and a
        // cold core's unknown occupancy must land in separate charts
        // with their own labels, and each core keeps its own series.
        let unknown = ThreadIdentity::unknown();
        let unknown_occupancy = MetricTuple {
            kind: MetricKind::CpuOccupancy,
            process_name: unknown.process_name,
            user: unknown.user,
            timestamp: Timestamp(0),
            value: 1.0,
            tid: unknown.tid,
            pid: unknown.pid,
            core: CoreId(1),
            uid: unknown.uid,
        };
        let tuples = vec![
            system_tuple(MetricKind::Ipc, 0, 0, 1.2),
            system_tuple(MetricKind::Ipc, 1, 0, 0.8),
            unknown_occupancy,
        ];
        let mut out = Vec::new();
        write_json_chart(&mut out, &tuples).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(json.get("0").is_none());
        assert_eq!(json["system:cpu0"]["process"], "<system>");
        assert_eq!(json["unknown:cpu1"]["process"], "<unknown>");
        assert_eq!(json["system:cpu0"]["series"]["ipc"].as_array().unwrap().len(), 1);
        assert_eq!(json["system:cpu1"]["series"]["ipc"].as_array().unwrap().len(), 1);
        let occ = &json["unknown:cpu1"]["series"]["cpu_occupancy"];
        assert!((occ[0]["v"].as_f64().unwrap() - 100.0).abs() < 1e-9);
    }
}
