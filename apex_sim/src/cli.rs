// apex_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Apex: a headless fixed-step vehicle dynamics simulator.
///
/// Runs a scenario file against a car description and prints telemetry;
/// the driveline state can be persisted and restored between runs.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/flat_launch.toml")]
    pub scenario: PathBuf,

    /// Override the car file referenced by the scenario.
    #[arg(long)]
    pub car: Option<PathBuf>,

    /// Override the scenario duration in seconds.
    #[arg(long)]
    pub duration: Option<f64>,

    /// List the car files under the asset directory and exit.
    #[arg(long, default_value_t = false)]
    pub list_cars: bool,

    /// Directory scanned by --list-cars.
    #[arg(long, default_value = "assets/cars")]
    pub cars_dir: PathBuf,

    /// Write the persisted driveline state to this file after the run.
    #[arg(long)]
    pub save_state: Option<PathBuf>,

    /// Restore a previously saved driveline state before running.
    #[arg(long)]
    pub restore_state: Option<PathBuf>,
}
