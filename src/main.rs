use std::path::PathBuf;

use clap::{Parser, Subcommand};
use excel_consolidator::pipeline::{self, ConsolidateOptions};
use excel_consolidator::{ConsolidateError, Result};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging()?;
    match cli.command {
        Command::Consolidate(args) => execute_consolidate(args),
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| ConsolidateError::Logging(error.to_string()))
}

fn execute_consolidate(args: ConsolidateArgs) -> Result<()> {
    for input in &args.inputs {
        if !input.exists() {
            return Err(ConsolidateError::MissingInput(input.clone()));
        }
    }

    let options = ConsolidateOptions {
        report: args.report,
        summary_json: args.summary_json,
        template: args.template,
        strict: args.strict,
    };
    let summary = pipeline::consolidate_files(&args.inputs, &args.output, &options)?;

    println!(
        "consolidated {} table(s) from {} file(s) into {} ({} row(s))",
        summary.table_count,
        summary.files_read,
        args.output.display(),
        summary.row_count
    );
    if summary.files_skipped > 0 {
        eprintln!(
            "warning: {} input file(s) could not be read",
            summary.files_skipped
        );
    }
    if !summary.validation.is_valid {
        eprintln!("warning: integrity validation found discrepancies; use --report for details");
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Consolidate stacked Excel tables into a single workbook."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge every table found in the input workbooks into one output file.
    Consolidate(ConsolidateArgs),
}

#[derive(clap::Args)]
struct ConsolidateArgs {
    /// Input workbooks (.xlsx or .xls).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output workbook path.
    #[arg(long)]
    output: PathBuf,

    /// Write the anomaly and integrity report to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write the validation summary as JSON to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Custom column template: a JSON array of column names.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Exit with an error when the integrity validation fails.
    #[arg(long)]
    strict: bool,
}
