// apex_core/src/driveline/clutch.rs

use crate::config::ClutchConfig;
use crate::error::VehicleError;

/// Torque-transfer coupling between the engine crank and the transmission
/// input shaft.
///
/// Modeled as a highly viscous coupling whose drag torque grows with the
/// speed difference between the two shafts, clamped by the friction capacity
/// scaled by the current engagement. An unclamped result means the plates
/// are locked.
#[derive(Debug, Clone)]
pub struct Clutch {
    /// sliding friction x max pressure x area x radius.
    capacity: f64,
    engagement: f64,
    last_torque: f64,
    locked: bool,
}

impl Clutch {
    pub fn from_config(cfg: &ClutchConfig) -> Result<Self, VehicleError> {
        let capacity = cfg.sliding_friction * cfg.max_pressure * cfg.area * cfg.radius;
        if capacity <= 0.0 {
            return Err(VehicleError::invalid(
                "clutch",
                "friction, pressure, area and radius must all be positive",
            ));
        }
        Ok(Self {
            capacity,
            engagement: 1.0,
            last_torque: 0.0,
            locked: false,
        })
    }

    pub fn set_engagement(&mut self, value: f64) {
        self.engagement = value.clamp(0.0, 1.0);
    }

    pub fn engagement(&self) -> f64 {
        self.engagement
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn last_torque(&self) -> f64 {
        self.last_torque
    }

    /// Drag torque applied to the engine crank for the current speed pair.
    /// Positive when the drive side is faster than the crank.
    pub fn torque(&mut self, crank_speed: f64, drive_speed: f64) -> f64 {
        let max_torque = self.engagement * self.capacity;
        let speed_diff = drive_speed - crank_speed;
        let viscous = max_torque * speed_diff;
        let drag = viscous.clamp(-max_torque, max_torque);
        self.locked = drag == viscous;
        self.last_torque = drag;
        drag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_config;

    fn clutch() -> Clutch {
        Clutch::from_config(&sample_config().clutch).unwrap()
    }

    #[test]
    fn disengaged_clutch_transfers_nothing() {
        let mut c = clutch();
        c.set_engagement(0.0);
        assert_eq!(c.torque(300.0, 0.0), 0.0);
    }

    #[test]
    fn drag_is_clamped_by_capacity() {
        let mut c = clutch();
        c.set_engagement(1.0);
        let capacity = c.capacity;
        // A huge speed difference saturates at the capacity and unlocks.
        assert_eq!(c.torque(500.0, 0.0), -capacity);
        assert!(!c.is_locked());
        assert_eq!(c.torque(0.0, 500.0), capacity);
    }

    #[test]
    fn near_equal_speeds_lock_the_plates() {
        let mut c = clutch();
        c.set_engagement(1.0);
        let drag = c.torque(100.0, 100.0001);
        assert!(c.is_locked());
        assert!(drag.abs() < c.capacity);
    }

    #[test]
    fn engagement_scales_the_cap() {
        let mut c = clutch();
        c.set_engagement(0.5);
        let half = c.torque(500.0, 0.0).abs();
        c.set_engagement(1.0);
        let full = c.torque(500.0, 0.0).abs();
        assert!(half < full);
    }
}
