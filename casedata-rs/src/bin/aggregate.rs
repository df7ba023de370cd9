use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::info;

use casedata::{CONDENSED_FILE, Environment, RAW_FILE, aggregate_file};

/// Sums the raw COVID-19 event log into one total per day.
#[derive(Parser, Debug)]
#[command(name = "aggregate")]
struct Args {
    /// Optional path for a config file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the raw and condensed data files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    casedata::log::init_logging(args.verbose);

    let mut env = match &args.config {
        Some(path) => Environment::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Environment::default(),
    };
    if let Some(dir) = args.data_dir {
        env.set_data_dir(dir);
    }

    let raw_path = env.require_file(RAW_FILE)?;
    let condensed_path = env.file(CONDENSED_FILE)?;

    info!("reading raw records from {}", raw_path.display());
    let series = aggregate_file(&raw_path)
        .with_context(|| format!("failed to aggregate {}", raw_path.display()))?
        .into_series();

    // Nothing is written unless every record parsed
    series
        .save(&condensed_path)
        .with_context(|| format!("failed to write {}", condensed_path.display()))?;

    match (series.first_date(), series.last_date()) {
        (Some(first), Some(last)) => info!("wrote {} days ({first} to {last})", series.len()),
        _ => info!("wrote an empty series"),
    }
    info!(
        "{} sha256 {}",
        condensed_path.display(),
        series.digest()
    );
    Ok(())
}
