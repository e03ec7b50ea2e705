// apex_sim/src/config.rs

//! Scenario and car loading. The car parameter schema itself lives in
//! `apex_core::config`; this module only owns the file plumbing.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::Deserialize;

use apex_core::prelude::VehicleConfig;

/// Root of a `scenario.toml` file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: Simulation,

    /// Path to the car description TOML, relative to the working directory.
    pub car: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Simulation {
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
    /// Fixed physics rate in Hz.
    pub step_hz: f64,
    /// Host frame rate in Hz; multiple physics steps run per frame when it
    /// is lower than `step_hz`.
    pub frame_hz: f64,
    /// Body spawn height above the ground plane in m.
    pub spawn_height: f64,
    /// Gravity in m/s^2.
    pub gravity: [f64; 3],
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            duration_seconds: 20.0,
            step_hz: 240.0,
            frame_hz: 60.0,
            spawn_height: 0.45,
            gravity: [0.0, 0.0, -9.81],
        }
    }
}

pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, figment::Error> {
    Figment::new().merge(Toml::file(path)).extract()
}

pub fn load_car(path: &Path) -> Result<VehicleConfig, figment::Error> {
    Figment::new().merge(Toml::file(path)).extract()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_defaults_are_sane() {
        let sim = Simulation::default();
        assert!(sim.step_hz >= sim.frame_hz);
        assert!(sim.duration_seconds > 0.0);
        assert!(sim.gravity[2] < 0.0);
    }
}
