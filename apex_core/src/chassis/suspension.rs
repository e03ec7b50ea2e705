// apex_core/src/chassis/suspension.rs

use crate::config::SuspensionConfig;
use crate::error::VehicleError;
use crate::types::Vec3;

/// Spring/damper strut for one corner.
///
/// Displacement is the compression from full droop, clamped to [0, travel].
/// The damper is asymmetric: `bounce` resists compression, `rebound`
/// resists extension. The resulting wheel normal force is never negative;
/// the strut cannot pull the wheel into the ground.
#[derive(Debug, Clone)]
pub struct Suspension {
    spring_constant: f64,
    bounce: f64,
    rebound: f64,
    travel: f64,
    attachment: Vec3,

    displacement: f64,
    last_displacement: f64,
    normal_force: f64,
}

impl Suspension {
    /// `mirror` flips the attachment across the centerline for the right side.
    pub fn from_config(cfg: &SuspensionConfig, mirror: bool) -> Result<Self, VehicleError> {
        if cfg.spring_constant <= 0.0 || cfg.travel <= 0.0 {
            return Err(VehicleError::invalid(
                "suspension",
                "spring constant and travel must be positive",
            ));
        }
        let y = if mirror { -cfg.position[1] } else { cfg.position[1] };
        Ok(Self {
            spring_constant: cfg.spring_constant,
            bounce: cfg.bounce,
            rebound: cfg.rebound,
            travel: cfg.travel,
            attachment: Vec3::new(cfg.position[0], y, cfg.position[2]),
            displacement: 0.0,
            last_displacement: 0.0,
            normal_force: 0.0,
        })
    }

    /// Wheel center at full droop, body frame.
    pub fn attachment(&self) -> Vec3 {
        self.attachment
    }

    pub fn travel(&self) -> f64 {
        self.travel
    }

    pub fn displacement(&self) -> f64 {
        self.displacement
    }

    pub fn normal_force(&self) -> f64 {
        self.normal_force
    }

    /// Advances the strut to the given compression and returns the wheel
    /// normal force for this tick.
    pub fn update(&mut self, compression: f64, dt: f64) -> f64 {
        self.last_displacement = self.displacement;
        self.displacement = compression.clamp(0.0, self.travel);

        let rate = (self.displacement - self.last_displacement) / dt;
        let damping = if rate > 0.0 { self.bounce } else { self.rebound };

        let force = self.spring_constant * self.displacement + damping * rate;
        self.normal_force = force.max(0.0);
        self.normal_force
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn strut() -> Suspension {
        Suspension::from_config(
            &SuspensionConfig {
                spring_constant: 50_000.0,
                bounce: 3_000.0,
                rebound: 4_000.0,
                travel: 0.2,
                position: [1.2, 0.75, -0.1],
            },
            false,
        )
        .unwrap()
    }

    #[test]
    fn displacement_is_clamped_to_travel() {
        let mut s = strut();
        s.update(0.5, 0.01);
        assert_relative_eq!(s.displacement(), 0.2);
        s.update(-0.3, 0.01);
        assert_relative_eq!(s.displacement(), 0.0);
    }

    #[test]
    fn static_force_is_the_spring_term() {
        let mut s = strut();
        s.update(0.1, 0.01);
        // Second update at the same compression has zero rate.
        let force = s.update(0.1, 0.01);
        assert_relative_eq!(force, 50_000.0 * 0.1);
    }

    #[test]
    fn normal_force_is_never_negative() {
        let mut s = strut();
        s.update(0.15, 0.01);
        // Rapid extension: rebound damping exceeds the spring force.
        let force = s.update(0.0, 0.01);
        assert_eq!(force, 0.0);
    }

    #[test]
    fn mirrored_attachment_flips_y() {
        let cfg = SuspensionConfig {
            spring_constant: 50_000.0,
            bounce: 3_000.0,
            rebound: 4_000.0,
            travel: 0.2,
            position: [1.2, 0.75, -0.1],
        };
        let left = Suspension::from_config(&cfg, false).unwrap();
        let right = Suspension::from_config(&cfg, true).unwrap();
        assert_relative_eq!(left.attachment().y, -right.attachment().y);
    }
}
