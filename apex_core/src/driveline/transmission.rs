// apex_core/src/driveline/transmission.rs

use crate::config::TransmissionConfig;
use crate::error::VehicleError;

/// Gear selection and shaft-speed/torque conversion.
///
/// Gear indices are signed: negative is reverse, 0 is neutral, positive is
/// forward. Neutral has ratio zero, which decouples the engine from the
/// wheels entirely.
#[derive(Debug, Clone)]
pub struct Transmission {
    forward: Vec<f64>,
    reverse: f64,
    shift_time: f64,
    gear: i32,
}

impl Transmission {
    pub fn from_config(cfg: &TransmissionConfig) -> Result<Self, VehicleError> {
        if cfg.gear_ratios.is_empty() {
            return Err(VehicleError::EmptyGearTable);
        }
        if cfg.reverse_ratio <= 0.0 {
            return Err(VehicleError::invalid(
                "transmission.reverse_ratio",
                "must be a positive magnitude",
            ));
        }
        Ok(Self {
            forward: cfg.gear_ratios.clone(),
            reverse: cfg.reverse_ratio,
            shift_time: cfg.shift_time,
            gear: 0,
        })
    }

    pub fn gear(&self) -> i32 {
        self.gear
    }

    pub fn forward_gears(&self) -> i32 {
        self.forward.len() as i32
    }

    pub fn reverse_gears(&self) -> i32 {
        1
    }

    pub fn shift_time(&self) -> f64 {
        self.shift_time
    }

    /// Ratio of a gear; out-of-range gears and neutral are zero.
    pub fn ratio(&self, gear: i32) -> f64 {
        if gear > 0 && gear <= self.forward_gears() {
            self.forward[(gear - 1) as usize]
        } else if gear < 0 && gear >= -self.reverse_gears() {
            -self.reverse
        } else {
            0.0
        }
    }

    pub fn current_ratio(&self) -> f64 {
        self.ratio(self.gear)
    }

    /// Engages `gear` if it exists. An out-of-range request leaves the
    /// transmission untouched and returns false.
    pub fn shift(&mut self, gear: i32) -> bool {
        if gear >= -self.reverse_gears() && gear <= self.forward_gears() {
            self.gear = gear;
            true
        } else {
            false
        }
    }

    /// Transmission input (clutch side) speed for a given driveshaft speed.
    pub fn clutch_speed(&self, driveshaft_speed: f64) -> f64 {
        driveshaft_speed * self.current_ratio()
    }

    /// Driveshaft torque produced from the clutch-side torque.
    pub fn torque(&self, clutch_torque: f64) -> f64 {
        clutch_torque * self.current_ratio()
    }
}
