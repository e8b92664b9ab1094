use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wfpfix::{run_direct, run_multi, LinearConversion, RunOptions, SequenceNeighborSource};
use wfpfix_core::{CorrectionConfig, ReferenceSelector};

const CONFIG_ENV: &str = "WFPFIX_CONFIG";

#[derive(Parser, Debug)]
#[command(author, version, about = "Profiler timestamp reconciliation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Correct a single-profile file against one reference file
    Direct(CommonArgs),
    /// Correct a multi-profile file, searching neighbouring reference files
    Multi(MultiArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Target CSV with `timestamp` and value columns
    #[arg(long)]
    target: PathBuf,
    /// Primary reference CSV
    #[arg(long)]
    reference: PathBuf,
    /// Output CSV; defaults to `<target>.corrected.csv`
    #[arg(long = "out")]
    output: Option<PathBuf>,
    /// JSON report of per-profile outcomes
    #[arg(long)]
    report: Option<PathBuf>,
    /// TOML correction settings (falls back to $WFPFIX_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Target column holding the raw correlating value
    #[arg(long, default_value = "value")]
    value_column: String,
    /// Multiplier applied to raw target values
    #[arg(long, default_value_t = 1.0)]
    scale: f64,
    /// Offset added after scaling
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset: f64,
    /// Reference stream to read
    #[arg(long, default_value = "engineering")]
    stream: String,
    /// Reference field correlated with the target value
    #[arg(long, default_value = "pressure")]
    field: String,
}

#[derive(Args, Debug)]
struct MultiArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Directory holding neighbouring reference files; defaults to the
    /// primary reference's directory
    #[arg(long)]
    search_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Direct(args) => {
            let options = run_options(args)?;
            let report = run_direct(&options)?;
            print_summary(&options.output, report.corrected_profiles(), report.profiles.len());
        }
        Command::Multi(args) => {
            let options = run_options(args.common)?;
            let source = SequenceNeighborSource::new(args.search_dir);
            let report = run_multi(&options, &source)?;
            print_summary(&options.output, report.corrected_profiles(), report.profiles.len());
        }
    }

    Ok(())
}

fn run_options(args: CommonArgs) -> Result<RunOptions> {
    let config = load_config(args.config.as_deref())?;
    let output = args
        .output
        .unwrap_or_else(|| args.target.with_extension("corrected.csv"));

    Ok(RunOptions {
        target: args.target,
        reference: args.reference,
        output,
        report: args.report,
        value_column: args.value_column,
        selector: ReferenceSelector::new(args.stream, args.field),
        conversion: LinearConversion {
            scale: args.scale,
            offset: args.offset,
        },
        config,
    })
}

fn load_config(explicit: Option<&Path>) -> Result<CorrectionConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => env::var_os(CONFIG_ENV).map(PathBuf::from),
    };

    match path {
        Some(path) => {
            info!("loading correction settings from {}", path.display());
            CorrectionConfig::from_toml_file(&path)
                .with_context(|| format!("invalid correction settings in {}", path.display()))
        }
        None => Ok(CorrectionConfig::default()),
    }
}

fn print_summary(output: &Path, corrected: usize, total: usize) {
    println!(
        "Corrected {corrected} of {total} profiles; wrote {}",
        output.display()
    );
}
