mod cli;
mod error;
mod metrics;
mod model;
mod output;
mod reader;

use crate::error::Result;
use crate::model::Layout;
use clap::Parser;
use miette::IntoDiagnostic;
use std::path::PathBuf;

/// Summarize TRA/TRB records of a VDJdb export as a markdown report.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Markdown report to write. Defaults to a name derived from the layout.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Tab-separated VDJdb export. Defaults to a name derived from the layout.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Column layout of the input.
    #[arg(short, long, value_enum, default_value_t = Layout::AllSpecies)]
    layout: Layout,

    /// 1-based chain, CDR3, species and epitope columns, overriding the layout.
    /// Example: "2,3,6,10".
    #[arg(short, long = "columns")]
    columns_spec: Option<String>,

    /// Overwrite existing outputs without asking.
    #[arg(short, long)]
    force: bool,

    /// Number of epitopes listed in the frequency ranking.
    #[arg(short = 'n', long, default_value_t = 20)]
    top: usize,

    /// List the most frequent epitopes even when the layout does not by default.
    #[arg(long)]
    rank_epitopes: bool,

    /// Also write the metrics as JSON to this path.
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    json: Option<PathBuf>,

    /// Number of threads used to evaluate metrics.
    #[arg(short, long)]
    threads: Option<usize>,
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let report_spec = cli::build_report_spec(&args)?;
    report_spec.print_paths();
    cli::run(&report_spec)
}

fn main() -> miette::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    try_main().into_diagnostic()
}
