//! PV quote simulator entry point: CLI wiring and config-driven simulator construction.

mod cli;

use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pv_quote_sim::config::ScenarioConfig;
use pv_quote_sim::error::{Result, SimError};
use pv_quote_sim::io::{export_hourly_csv, export_monthly_csv};

use cli::CliOptions;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the scenario: `--scenario` takes priority, then `--preset`, then office.
fn load_scenario(cli: &CliOptions) -> Result<ScenarioConfig> {
    let mut cfg = match &cli.scenario {
        Some(path) => ScenarioConfig::from_toml_file(path)?,
        None => ScenarioConfig::from_preset(cli.preset_or_default())?,
    };

    if cli.offline {
        cfg.weather.offline = true;
    }
    if let Some(dir) = &cli.cache_dir {
        cfg.weather.cache_dir = Some(dir.clone());
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        return Err(SimError::InvalidInput(errors));
    }
    Ok(cfg)
}

fn run(cli: &CliOptions) -> Result<()> {
    let scenario = load_scenario(cli)?;
    let simulator = scenario.build_simulator();
    let run = simulator.run(&scenario.to_request())?;

    info!(
        weather = ?run.weather_origin,
        pv_model = run.pv_model,
        "simulation finished"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&run.result)?);
    } else {
        println!("{}", run.result);
    }

    if let Some(path) = &cli.hourly_out {
        export_hourly_csv(&run.hour_records(), path)?;
        eprintln!("Hourly flows written to {}", path.display());
    }
    if let Some(path) = &cli.monthly_out {
        export_monthly_csv(&run.result.monthly_summary, path)?;
        eprintln!("Monthly summary written to {}", path.display());
    }
    Ok(())
}

fn main() {
    let cli = CliOptions::parse();
    init_tracing();

    if let Err(e) = run(&cli) {
        match e {
            SimError::InvalidInput(errors) => {
                for e in &errors {
                    eprintln!("{e}");
                }
            }
            other => eprintln!("error: {other}"),
        }
        process::exit(1);
    }
}
