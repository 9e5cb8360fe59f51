//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "pv-quote-sim")]
#[command(author, version, about = "Annual PV and battery simulation for commercial sites")]
#[command(
    long_about = "Simulates one representative year of a commercial PV system with optional \
    battery storage and reports energy flows, autonomy and investment figures.\n\
    \nIf neither --scenario nor --preset is given, the office preset is used.\n\
    \nExamples:\n  \
    pv-quote-sim --preset retail\n  \
    pv-quote-sim --scenario site.toml --cache-dir ~/.cache/pv-quote-sim\n  \
    pv-quote-sim --preset office --offline --hourly-out hours.csv"
)]
pub struct CliOptions {
    /// Load scenario from TOML config file
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (office, retail, production, warehouse_no_battery)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Skip the weather provider and use synthetic weather
    #[arg(long)]
    pub offline: bool,

    /// Persist fetched weather years in this directory
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Export hourly flows to CSV
    #[arg(long, value_name = "PATH")]
    pub hourly_out: Option<PathBuf>,

    /// Export the monthly summary to CSV
    #[arg(long, value_name = "PATH")]
    pub monthly_out: Option<PathBuf>,

    /// Print the result as JSON instead of the text report
    #[arg(long)]
    pub json: bool,
}

impl CliOptions {
    /// The preset to load when no scenario file is given.
    pub fn preset_or_default(&self) -> &str {
        self.preset.as_deref().unwrap_or("office")
    }
}
