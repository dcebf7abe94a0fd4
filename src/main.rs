//! # framescope - Main Entry Point
//!
//! Loads a recorded capture, assembles the frame grid for the requested
//! process and interval width, and writes the flattened metric tuples
//! in the requested format to stdout or a file.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};

use framescope::analysis::build_frame_grid;
use framescope::cli::{Args, OutputFormat};
use framescope::export::{flatten_frames, write_flat_csv, write_json_chart, write_pivot_csv};
use framescope::trace_data::RecordedTrace;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();

    let trace = RecordedTrace::from_file(&args.trace)
        .with_context(|| format!("Failed to load trace {}", args.trace.display()))?;

    // Banner goes to stderr: stdout is reserved for the payload so the
    // default invocation stays pipeable.
    if !args.quiet {
        eprintln!("framescope v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("trace: {}", args.trace.display());
        eprintln!(
            "events: {} switches, {} samples, {} faults",
            trace.switches.len(),
            trace.samples.len(),
            trace.faults.len()
        );
    }

    let store = build_frame_grid(&trace, &args.process, args.interval)?;
    info!("frame grid: {} frames across {} cores", store.len(), store.core_count);

    let tuples = flatten_frames(&store);

    match args.output {
        Some(ref path) => {
            let file =
                File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            write_tuples(BufWriter::new(file), args.format, &tuples)?;
            if !args.quiet {
                eprintln!("saved: {}", path.display());
            }
        }
        None => {
            let stdout = std::io::stdout();
            write_tuples(stdout.lock(), args.format, &tuples)?;
        }
    }

    if !args.quiet {
        eprintln!("{} frames, {} tuples", store.len(), tuples.len());
    }

    Ok(())
}

fn write_tuples<W: Write>(
    writer: W,
    format: OutputFormat,
    tuples: &[framescope::export::MetricTuple],
) -> Result<()> {
    match format {
        OutputFormat::FlatCsv => write_flat_csv(writer, tuples)?,
        OutputFormat::PivotCsv => write_pivot_csv(writer, tuples)?,
        OutputFormat::Json => write_json_chart(writer, tuples)?,
    }
    Ok(())
}
