// apex_core/src/driveline/differential.rs

use crate::config::DifferentialConfig;
use crate::error::VehicleError;

/// Torque split and speed averaging between two output shafts.
///
/// An open differential (zero anti-slip) splits torque by the fixed ratio
/// regardless of relative wheel speed. A limited-slip unit adds a viscous
/// drag proportional to the speed difference, clamped by the anti-slip
/// capacity, which transfers torque from the faster to the slower output.
/// With `anti_slip_torque` set the capacity follows the input torque
/// instead (torque-sensing LSD).
#[derive(Debug, Clone)]
pub struct Differential {
    final_drive: f64,
    anti_slip: f64,
    anti_slip_torque: f64,
    anti_slip_torque_deceleration_factor: f64,
    torque_split: f64,

    side1_speed: f64,
    side2_speed: f64,
    side1_torque: f64,
    side2_torque: f64,
}

impl Differential {
    pub fn from_config(cfg: &DifferentialConfig) -> Result<Self, VehicleError> {
        if cfg.final_drive == 0.0 {
            return Err(VehicleError::invalid(
                "differential.final_drive",
                "must be non-zero",
            ));
        }
        if !(0.0..=1.0).contains(&cfg.torque_split) {
            return Err(VehicleError::invalid(
                "differential.torque_split",
                "must be within [0, 1]",
            ));
        }
        Ok(Self {
            final_drive: cfg.final_drive,
            anti_slip: cfg.anti_slip,
            anti_slip_torque: cfg.anti_slip_torque,
            anti_slip_torque_deceleration_factor: cfg.anti_slip_torque_deceleration_factor,
            torque_split: cfg.torque_split,
            side1_speed: 0.0,
            side2_speed: 0.0,
            side1_torque: 0.0,
            side2_torque: 0.0,
        })
    }

    pub fn final_drive(&self) -> f64 {
        self.final_drive
    }

    /// Records the two output speeds and returns the driveshaft speed
    /// consistent with their average.
    pub fn driveshaft_speed(&mut self, side1: f64, side2: f64) -> f64 {
        self.side1_speed = side1;
        self.side2_speed = side2;
        self.final_drive * 0.5 * (side1 + side2)
    }

    /// Splits `driveshaft_torque` between the two outputs using the speeds
    /// recorded by the last `driveshaft_speed` call.
    pub fn compute_wheel_torques(&mut self, driveshaft_torque: f64) {
        let mut capacity = self.anti_slip;
        if self.anti_slip_torque > 0.0 {
            // Torque-sensing: capacity follows the input torque.
            capacity = self.anti_slip_torque * driveshaft_torque;
        }
        if capacity < 0.0 {
            capacity *= -self.anti_slip_torque_deceleration_factor;
        }
        let capacity = capacity.max(0.0);

        let drag =
            (self.anti_slip * (self.side1_speed - self.side2_speed)).clamp(-capacity, capacity);

        let torque = driveshaft_torque * self.final_drive;
        self.side1_torque = torque * (1.0 - self.torque_split) - drag;
        self.side2_torque = torque * self.torque_split + drag;
    }

    pub fn side1_torque(&self) -> f64 {
        self.side1_torque
    }

    pub fn side2_torque(&self) -> f64 {
        self.side2_torque
    }
}
