//! Exporter behavior over real frame stores.

use framescope::analysis::{build_frame_grid, FrameStore};
use framescope::domain::{CoreId, Pid, Tid, Timestamp, Uid, TICKS_PER_MS};
use framescope::export::{flatten_frames, write_flat_csv, write_json_chart, MetricKind};
use framescope::trace_data::{
    ContextSwitch, CounterSample, ProcessRecord, RecordedTrace, ThreadRecord, ThreadState,
};
use std::collections::HashMap;
use std::io::Write;

const PROC_PID: u32 = 100;
const MAIN_TID: u32 = 101;
const WORKER_TID: u32 = 102;

fn capture() -> RecordedTrace {
    let thread = |tid: u32, name: &str| ThreadRecord {
        tid: Tid(tid),
        name: name.to_string(),
        user: "alice".to_string(),
        uid: Uid(500),
    };
    let switch = |ts_ms: u64, old: u32, new: u32| ContextSwitch {
        timestamp: Timestamp(ts_ms * TICKS_PER_MS),
        core: CoreId(0),
        old_tid: Tid(old),
        old_pid: Pid(PROC_PID),
        new_tid: Tid(new),
        new_pid: Pid(PROC_PID),
        resulting_state: ThreadState::Running,
    };
    let sample = |ts_ms: u64| CounterSample {
        timestamp: Timestamp(ts_ms * TICKS_PER_MS),
        core: CoreId(0),
        ipc: 1.5,
        l2_hits: 100,
        l2_misses: 10,
        l3_hits: 100,
        l3_misses: 10,
        l2_clock: 2.4,
        l3_clock: 2.4,
    };
    let mut trace = RecordedTrace {
        processes: vec![ProcessRecord {
            name: "my-server".to_string(),
            pid: Pid(PROC_PID),
            start: Timestamp(0),
            end: Timestamp(1_000 * TICKS_PER_MS),
            threads: vec![thread(MAIN_TID, "main"), thread(WORKER_TID, "worker")],
        }],
        switches: vec![
            switch(0, 0, MAIN_TID),
            switch(250, MAIN_TID, WORKER_TID),
            switch(650, WORKER_TID, MAIN_TID),
        ],
        samples: vec![sample(0), sample(500), sample(1_000)],
        faults: vec![],
    };
    trace.sort_streams();
    trace
}

fn store() -> FrameStore {
    build_frame_grid(&capture(), "my-server", 200).unwrap()
}

#[test]
fn test_flatten_then_regroup_reconstructs_occupancy() {
    let store = store();
    let tuples = flatten_frames(&store);
    let width = store.interval_width;

    // Regroup occupancy tuples by (core, window index, tid) and compare
    // against the frames they came from.
    let mut regrouped: HashMap<(u32, u64, u32), f64> = HashMap::new();
    for t in tuples.iter().filter(|t| t.kind == MetricKind::CpuOccupancy) {
        let window_index = (t.timestamp.0 - store.start.0) / width.0;
        *regrouped.entry((t.core.0, window_index, t.tid.0)).or_insert(0.0) += t.value;
    }

    for (index, frame) in store.frames().iter().enumerate() {
        let window_index = (index / store.core_count as usize) as u64;
        for (identity, span) in &frame.occupancy {
            if span.is_zero() {
                continue;
            }
            let key = (frame.core.0, window_index, identity.tid.0);
            let expected = span.fraction_of(width);
            let got = regrouped.remove(&key).unwrap();
            assert!((got - expected).abs() < f64::EPSILON, "mismatch at {key:?}");
        }
    }
    assert!(regrouped.is_empty(), "tuples without a source frame: {regrouped:?}");
}

#[test]
fn test_flat_csv_row_count_matches_tuples() {
    let tuples = flatten_frames(&store());
    let mut out = Vec::new();
    write_flat_csv(&mut out, &tuples).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), tuples.len() + 1);
    assert!(text.starts_with("kind,process,user,timestamp,value,tid,pid,core,uid"));
}

#[test]
fn test_json_chart_written_to_file_is_valid() {
    let tuples = flatten_frames(&store());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.json");
    {
        let mut file = std::fs::File::create(&path).unwrap();
        write_json_chart(&mut file, &tuples).unwrap();
        file.flush().unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();

    // Both catalog threads and the system subject appear, and every
    // series value is within the charting cap.
    assert!(json.get(MAIN_TID.to_string()).is_some());
    assert!(json.get(WORKER_TID.to_string()).is_some());
    assert!(json.get("system:cpu0").is_some());
    for (_, chart) in json.as_object().unwrap() {
        for (_, series) in chart["series"].as_object().unwrap() {
            for point in series.as_array().unwrap() {
                let v = point["v"].as_f64().unwrap();
                assert!((0.0..=100.0).contains(&v));
            }
        }
    }
}

#[test]
fn test_occupancy_fractions_sum_to_one_per_cell() {
    let tuples = flatten_frames(&store());

    let mut per_cell: HashMap<(u32, u64), f64> = HashMap::new();
    for t in tuples.iter().filter(|t| t.kind == MetricKind::CpuOccupancy) {
        *per_cell.entry((t.core.0, t.timestamp.0)).or_insert(0.0) += t.value;
    }
    for (cell, total) in per_cell {
        assert!((total - 1.0).abs() < 1e-9, "cell {cell:?} sums to {total}");
    }
}
