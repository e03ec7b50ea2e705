// apex_core/src/chassis/aero.rs

use crate::config::AeroDeviceConfig;
use crate::error::VehicleError;
use crate::types::Vec3;

/// One aerodynamic device: a drag body, optionally with a lifting surface.
/// Forces are computed in the body frame from the body-space wind vector and
/// applied at the device position.
#[derive(Debug, Clone)]
pub struct AeroDevice {
    air_density: f64,
    drag_frontal_area: f64,
    drag_coefficient: f64,
    lift_surface_area: f64,
    lift_coefficient: f64,
    lift_efficiency: f64,
    position: Vec3,
}

impl AeroDevice {
    pub fn from_config(cfg: &AeroDeviceConfig) -> Result<Self, VehicleError> {
        if cfg.air_density <= 0.0 {
            return Err(VehicleError::invalid(
                "aerodynamics.air_density",
                "must be positive",
            ));
        }
        Ok(Self {
            air_density: cfg.air_density,
            drag_frontal_area: cfg.drag_frontal_area,
            drag_coefficient: cfg.drag_coefficient,
            lift_surface_area: cfg.lift_surface_area,
            lift_coefficient: cfg.lift_coefficient,
            lift_efficiency: cfg.lift_efficiency,
            position: Vec3::new(cfg.position[0], cfg.position[1], cfg.position[2]),
        })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Body-frame force for the given body-space wind vector (the negated
    /// body-space velocity of the car).
    pub fn force(&self, bodyspace_wind: &Vec3) -> Vec3 {
        // Drag along the wind.
        let drag_force = bodyspace_wind
            * bodyspace_wind.norm()
            * 0.5
            * self.air_density
            * self.drag_coefficient
            * self.drag_frontal_area;

        // Lift from the forward component of the airflow; a negative lift
        // coefficient produces downforce. Imperfect surfaces pay for their
        // lift with induced drag.
        let wind_speed = -bodyspace_wind.x; // positive when moving forward
        let k = 0.5 * self.air_density * wind_speed * wind_speed;
        let lift = k * self.lift_coefficient * self.lift_surface_area;
        let induced_drag = -lift.abs() * (1.0 - self.lift_efficiency);
        let lift_force = Vec3::new(induced_drag, 0.0, lift);

        drag_force + lift_force
    }

    /// 0.5 * rho * Cl * A, for the downforce telemetry query.
    pub fn lift_coefficient_total(&self) -> f64 {
        0.5 * self.air_density * self.lift_coefficient * self.lift_surface_area
    }

    /// 0.5 * rho * Cd * A, for the drag telemetry query.
    pub fn drag_coefficient_total(&self) -> f64 {
        0.5 * self.air_density * self.drag_coefficient * self.drag_frontal_area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wing() -> AeroDevice {
        AeroDevice::from_config(&AeroDeviceConfig {
            position: [-1.8, 0.0, 0.9],
            air_density: 1.2,
            drag_frontal_area: 0.1,
            drag_coefficient: 0.4,
            lift_surface_area: 1.0,
            lift_coefficient: -2.5,
            lift_efficiency: 0.9,
        })
        .unwrap()
    }

    #[test]
    fn drag_opposes_motion() {
        let wing = wing();
        // Car moving forward at 50 m/s: wind blows backwards over the body.
        let force = wing.force(&Vec3::new(-50.0, 0.0, 0.0));
        assert!(force.x < 0.0);
    }

    #[test]
    fn negative_lift_coefficient_gives_downforce() {
        let wing = wing();
        let force = wing.force(&Vec3::new(-50.0, 0.0, 0.0));
        assert!(force.z < 0.0);
        // 0.5 * rho * v^2 * Cl * A plus drag terms on x only.
        assert_relative_eq!(force.z, 0.5 * 1.2 * 2500.0 * -2.5 * 1.0);
    }

    #[test]
    fn still_air_produces_no_force() {
        let wing = wing();
        let force = wing.force(&Vec3::zeros());
        assert_relative_eq!(force.norm(), 0.0);
    }
}
