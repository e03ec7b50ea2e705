// apex_core/src/chassis/brake.rs

use crate::config::BrakeConfig;
use crate::error::VehicleError;

/// Friction torque generator for one wheel, fed by the brake pedal and the
/// handbrake lever.
#[derive(Debug, Clone)]
pub struct Brake {
    /// friction x max pressure x area x radius x bias.
    max_torque: f64,
    handbrake_gain: f64,

    brake_factor: f64,
    handbrake_factor: f64,
    will_lock: bool,
}

impl Brake {
    pub fn from_config(cfg: &BrakeConfig) -> Result<Self, VehicleError> {
        let max_torque = cfg.friction * cfg.max_pressure * cfg.area * cfg.radius * cfg.bias;
        if max_torque < 0.0 {
            return Err(VehicleError::invalid(
                "brake",
                "friction, pressure, area, radius and bias must be non-negative",
            ));
        }
        Ok(Self {
            max_torque,
            handbrake_gain: cfg.handbrake,
            brake_factor: 0.0,
            handbrake_factor: 0.0,
            will_lock: false,
        })
    }

    /// Pedal position in [0, 1]. ABS overrides this per tick.
    pub fn set_brake_factor(&mut self, value: f64) {
        self.brake_factor = value.clamp(0.0, 1.0);
    }

    pub fn brake_factor(&self) -> f64 {
        self.brake_factor
    }

    pub fn set_handbrake_factor(&mut self, value: f64) {
        self.handbrake_factor = value.clamp(0.0, 1.0);
    }

    /// Peak torque at full pedal.
    pub fn max_torque(&self) -> f64 {
        self.max_torque
    }

    /// Friction torque magnitude for the current pedal/lever positions.
    pub fn torque(&self) -> f64 {
        let factor = self
            .brake_factor
            .max(self.handbrake_factor * self.handbrake_gain);
        factor * self.max_torque
    }

    pub fn set_will_lock(&mut self, value: bool) {
        self.will_lock = value;
    }

    /// True when the last applied torque was enough to stop the wheel.
    pub fn will_lock(&self) -> bool {
        self.will_lock
    }
}
