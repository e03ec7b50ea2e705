// apex_core/src/chassis/wheel.rs

use crate::config::WheelConfig;
use crate::driveline::Shaft;
use crate::error::VehicleError;
use crate::types::rad_per_sec_to_rpm;

/// Rotational state of one wheel. Positive angular velocity rolls the car
/// forward.
#[derive(Debug, Clone)]
pub struct Wheel {
    shaft: Shaft,
    radius: f64,
    mass: f64,
}

impl Wheel {
    pub fn from_config(cfg: &WheelConfig) -> Result<Self, VehicleError> {
        if cfg.radius <= 0.0 || cfg.inertia <= 0.0 || cfg.mass <= 0.0 {
            return Err(VehicleError::invalid(
                "wheel",
                "radius, inertia and mass must be positive",
            ));
        }
        Ok(Self {
            shaft: Shaft::new(cfg.inertia),
            radius: cfg.radius,
            mass: cfg.mass,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inertia(&self) -> f64 {
        self.shaft.inertia()
    }

    pub fn ang_velocity(&self) -> f64 {
        self.shaft.ang_velocity()
    }

    pub fn set_ang_velocity(&mut self, value: f64) {
        self.shaft.set_ang_velocity(value);
    }

    pub fn rpm(&self) -> f64 {
        rad_per_sec_to_rpm(self.shaft.ang_velocity())
    }

    /// Contact-patch surface speed.
    pub fn surface_speed(&self) -> f64 {
        self.shaft.ang_velocity() * self.radius
    }

    pub fn integrate(&mut self, torque: f64, dt: f64) {
        self.shaft.apply_torque(torque, dt);
    }

    /// Applies a torque that opposes rotation without reversing the wheel
    /// within the step (same momentum bound as the engine/clutch coupling).
    /// Returns true when the wheel was brought to a stop, i.e. the opposing
    /// torque saturated.
    pub fn apply_opposing_torque(&mut self, magnitude: f64, dt: f64) -> bool {
        let speed = self.shaft.ang_velocity();
        let stopping = self.shaft.momentum(0.0).abs() / dt;
        if magnitude >= stopping {
            self.shaft.set_ang_velocity(0.0);
            true
        } else {
            self.shaft.apply_torque(-speed.signum() * magnitude, dt);
            false
        }
    }
}
