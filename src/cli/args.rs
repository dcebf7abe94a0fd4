//! CLI argument definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "framescope",
    about = "Correlate a recorded scheduler trace with hardware counter samples",
    after_help = "\
EXAMPLES:
    framescope capture.json -p my-server -i 100             Flat CSV to stdout
    framescope capture.json -p my-server -i 100 --format json -o chart.json
    framescope capture.json -p my- -i 300 --format pivot-csv -o pivot.csv"
)]
pub struct Args {
    /// Recorded trace file (JSON capture)
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Name prefix of the process to analyze
    #[arg(short, long, value_name = "PREFIX")]
    pub process: String,

    /// Frame interval width in milliseconds
    #[arg(short, long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::FlatCsv)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One CSV row per metric tuple
    FlatCsv,
    /// Per-thread, per-metric rows with one column per window
    PivotCsv,
    /// Chart payload keyed by thread id
    Json,
}
