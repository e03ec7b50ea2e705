// apex_sim/src/main.rs

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use walkdir::WalkDir;

use apex_sim::cli::Cli;
use apex_sim::config::{load_car, load_scenario};
use apex_sim::runner::Runner;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list_cars {
        list_cars(&cli.cars_dir);
        return ExitCode::SUCCESS;
    }

    let mut scenario = match load_scenario(&cli.scenario) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load scenario {}: {e}", cli.scenario.display());
            return ExitCode::FAILURE;
        }
    };
    if let Some(duration) = cli.duration {
        scenario.simulation.duration_seconds = duration;
    }
    let car_path = cli.car.as_ref().unwrap_or(&scenario.car);
    let car = match load_car(car_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load car {}: {e}", car_path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut runner = match Runner::new(scenario.simulation, &car) {
        Ok(r) => r,
        Err(e) => {
            // Construction fails closed: no partial vehicle, just the message.
            eprintln!("invalid car description: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &cli.restore_state {
        match std::fs::read_to_string(path).map_err(|e| e.to_string()).and_then(|text| {
            toml::from_str::<apex_core::prelude::SavedState>(&text).map_err(|e| e.to_string())
        }) {
            Ok(state) => runner.restore(&state),
            Err(e) => {
                eprintln!("failed to restore state from {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let summary = runner.run();
    println!(
        "done: top speed {:.2} m/s, distance {:.1} m, gear {}, rpm {:.0}, fuel {:.1}%",
        summary.top_speed,
        summary.distance,
        summary.final_gear,
        summary.final_rpm,
        summary.fuel_fraction * 100.0
    );

    if let Some(path) = &cli.save_state {
        let state = runner.saved_state();
        match toml::to_string(&state) {
            Ok(text) => {
                if let Err(e) = std::fs::write(path, text) {
                    eprintln!("failed to write state to {}: {e}", path.display());
                    return ExitCode::FAILURE;
                }
                println!("saved driveline state to {}", path.display());
            }
            Err(e) => {
                eprintln!("failed to serialize state: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn list_cars(dir: &Path) {
    let mut found = false;
    for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "toml")
        {
            println!("{}", entry.path().display());
            found = true;
        }
    }
    if !found {
        eprintln!("no car files under {}", dir.display());
    }
}
