pub mod error;
pub mod ode;
pub mod output;
pub mod parameters;
pub mod plot;
pub mod report;
pub mod sir;
pub mod timeline;

use std::path::PathBuf;

use anyhow::Context;
use casedata::{CONDENSED_FILE, CaseSeries, Environment};
use clap::{ArgAction, Parser};
use log::{info, warn};

use parameters::Parameters;
use report::Summary;
use sir::SirModel;
use timeline::{ObservedSeries, Timeline};

/// Compares the condensed daily case series with an SIR model run.
#[derive(Parser, Debug)]
#[command(name = "sir")]
struct Args {
    /// Optional path for a config file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the condensed data file
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Directory for the rendered charts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip rendering the charts
    #[arg(long)]
    no_plots: bool,

    /// Also write the simulated trajectory as CSV to this file in the output directory
    #[arg(long)]
    trajectory_csv: Option<String>,

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
    if let Some(dir) = args.output_dir {
        env.set_output_dir(Some(dir));
    }
    let env = env
        .with_input_type::<Parameters>()
        .context("invalid model parameters")?;
    let parameters = env.input.clone().unwrap_or_default();

    let condensed_path = env.require_file(CONDENSED_FILE)?;
    let condensed = CaseSeries::load(&condensed_path)
        .with_context(|| format!("failed to read {}", condensed_path.display()))?;
    let observed = ObservedSeries::new(&condensed, parameters.truncate)?;
    let timeline = Timeline::align(&observed, parameters.horizon)?;
    info!(
        "comparing {} observed days from {} against a {}-day horizon ending {}",
        observed.len(),
        timeline.origin(),
        timeline.horizon(),
        timeline.last_date()
    );
    info!(
        "N = {}, r0 = {}, duration = {}, beta = {}, gamma = {}",
        parameters.population(),
        parameters.r0,
        parameters.duration,
        parameters.beta(),
        parameters.gamma()
    );

    let output = SirModel::simulate(&parameters).context("SIR simulation failed")?;
    let summary = Summary::compute(&observed, &output, &timeline);

    if args.no_plots {
        info!("skipping charts");
    } else if env.output_dir().is_none() {
        warn!("no output directory configured, skipping charts");
    } else {
        plot::render_all(&env, &observed, &output, &timeline).context("failed to render charts")?;
    }

    if let Some(filename) = &args.trajectory_csv {
        output
            .write_csv(&env, filename, &timeline)
            .with_context(|| format!("failed to write {filename}"))?;
    }

    print!("{summary}");
    Ok(())
}

#[cfg(test)]
mod test {
    use casedata::Environment;
    use serde_json::json;

    use crate::parameters::Parameters;

    #[test]
    fn test_parameters_from_environment() {
        let env = Environment::from_json(json!({
            "input": {
                "r0": 2.5,
                "horizon": 200
            }
        }))
        .with_input_type::<Parameters>()
        .unwrap();
        let parameters = env.input.unwrap();
        assert_eq!(parameters.r0, 2.5);
        assert_eq!(parameters.horizon, 200);
        assert_eq!(parameters.duration, Parameters::default().duration);
        assert_eq!(parameters.truncate, 13);
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let result = Environment::from_json(json!({ "input": { "rO": 2.5 } }))
            .with_input_type::<Parameters>();
        assert!(result.is_err());
    }

    #[test]
    fn test_short_compartment_keys_from_environment() {
        let env = Environment::from_json(json!({
            "input": { "s0": 999.0, "i0": 1.0, "r0_recovered": 0.0 }
        }))
        .with_input_type::<Parameters>()
        .unwrap();
        let parameters = env.input.unwrap();
        assert_eq!(parameters.susceptible, 999.0);
        assert_eq!(parameters.infected, 1.0);
        assert_eq!(parameters.recovered, 0.0);
        assert_eq!(parameters.r0, Parameters::default().r0);
    }

    #[test]
    fn test_empty_input_uses_defaults() {
        let env = Environment::default().with_input_type::<Parameters>().unwrap();
        assert_eq!(env.input, Some(Parameters::default()));
    }
}
