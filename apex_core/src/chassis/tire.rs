// apex_core/src/chassis/tire.rs

use crate::config::TireConfig;
use crate::error::VehicleError;

/// Nonlinear tire friction model.
///
/// Longitudinal force follows a Fiala-form cubic in slip ratio that rises to
/// the friction limit at the critical slip and saturates there; lateral
/// force does the same in tan(slip angle). The two components are combined
/// with a friction ellipse so the contact patch never produces more total
/// force than the load allows. The friction coefficient itself degrades
/// with load above the nominal value (load sensitivity).
#[derive(Debug, Clone)]
pub struct Tire {
    friction_long: f64,
    friction_lat: f64,
    load_sensitivity: f64,
    nominal_load: f64,
    longitudinal_stiffness: f64,
    cornering_stiffness: f64,
    rolling_resistance: [f64; 2],
    pneumatic_trail: f64,

    slip_ratio: f64,
    slip_angle: f64,
    force: (f64, f64),
    aligning_torque: f64,
}

impl Tire {
    pub fn from_config(cfg: &TireConfig) -> Result<Self, VehicleError> {
        if cfg.friction_long <= 0.0 || cfg.friction_lat <= 0.0 {
            return Err(VehicleError::invalid(
                "tire",
                "friction coefficients must be positive",
            ));
        }
        if cfg.longitudinal_stiffness <= 0.0 || cfg.cornering_stiffness <= 0.0 {
            return Err(VehicleError::invalid(
                "tire",
                "stiffnesses must be positive",
            ));
        }
        Ok(Self {
            friction_long: cfg.friction_long,
            friction_lat: cfg.friction_lat,
            load_sensitivity: cfg.load_sensitivity,
            nominal_load: cfg.nominal_load,
            longitudinal_stiffness: cfg.longitudinal_stiffness,
            cornering_stiffness: cfg.cornering_stiffness,
            rolling_resistance: cfg.rolling_resistance,
            pneumatic_trail: cfg.pneumatic_trail,
            slip_ratio: 0.0,
            slip_angle: 0.0,
            force: (0.0, 0.0),
            aligning_torque: 0.0,
        })
    }

    pub fn slip_ratio(&self) -> f64 {
        self.slip_ratio
    }

    pub fn slip_angle(&self) -> f64 {
        self.slip_angle
    }

    /// (longitudinal, lateral) force from the last update, N.
    pub fn force(&self) -> (f64, f64) {
        self.force
    }

    pub fn aligning_torque(&self) -> f64 {
        self.aligning_torque
    }

    /// Load-corrected friction coefficient.
    fn effective_friction(&self, base: f64, load: f64) -> f64 {
        if self.load_sensitivity <= 0.0 || load <= 0.0 {
            return base;
        }
        let overload = (load / self.nominal_load - 1.0).max(0.0);
        (base * (1.0 - self.load_sensitivity * overload)).max(base * 0.2)
    }

    /// Slip ratio at which the longitudinal force saturates for the given
    /// load. Used as the target by the TCS/ABS threshold controllers.
    pub fn ideal_slip_ratio(&self, load: f64) -> f64 {
        let load = load.max(1.0);
        let mu = self.effective_friction(self.friction_long, load);
        3.0 * mu * load / self.longitudinal_stiffness
    }

    /// Fiala-form saturating curve: cubic rise to `mu * load`, flat beyond
    /// the critical slip. Monotone non-decreasing in |slip| up to the peak,
    /// constant after, never unbounded.
    fn fiala(slip: f64, stiffness: f64, mu_load: f64) -> f64 {
        let critical = 3.0 * mu_load / stiffness;
        let s = slip.abs();
        let magnitude = if s < critical {
            let c = stiffness;
            c * s - c * c / (3.0 * mu_load) * s * s + c * c * c / (27.0 * mu_load * mu_load) * s * s * s
        } else {
            mu_load
        };
        magnitude * slip.signum()
    }

    /// Computes contact-patch forces for this tick.
    ///
    /// Returns (longitudinal, lateral) in the wheel's ground-plane frame:
    /// positive longitudinal force pushes the car forward (wheel spinning
    /// faster than the ground), positive lateral force points left.
    pub fn update(&mut self, load: f64, slip_ratio: f64, slip_angle: f64) -> (f64, f64) {
        self.slip_ratio = slip_ratio;
        self.slip_angle = slip_angle;

        if load <= 0.0 {
            self.force = (0.0, 0.0);
            self.aligning_torque = 0.0;
            return self.force;
        }

        let mu_long = self.effective_friction(self.friction_long, load) * load;
        let mu_lat = self.effective_friction(self.friction_lat, load) * load;

        let fx = Self::fiala(slip_ratio, self.longitudinal_stiffness, mu_long);
        // Lateral force opposes the slip angle.
        let fy = -Self::fiala(slip_angle.tan(), self.cornering_stiffness, mu_lat);

        // Friction ellipse: scale the combined demand back onto the limit.
        let demand = (fx / mu_long).hypot(fy / mu_lat);
        let (fx, fy) = if demand > 1.0 {
            (fx / demand, fy / demand)
        } else {
            (fx, fy)
        };

        // Aligning-torque proxy for steering feedback: trail shrinks to
        // nothing as the contact patch saturates.
        let saturation = (fy.abs() / mu_lat).min(1.0);
        self.aligning_torque = -fy * self.pneumatic_trail * (1.0 - saturation);

        self.force = (fx, fy);
        self.force
    }

    /// Rolling-resistance force magnitude at the given forward speed.
    pub fn rolling_resistance(&self, speed: f64, load: f64) -> f64 {
        if load <= 0.0 {
            return 0.0;
        }
        load * (self.rolling_resistance[0] + self.rolling_resistance[1] * speed * speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_config;

    fn tire() -> Tire {
        Tire::from_config(&sample_config().rear.tire).unwrap()
    }

    #[test]
    fn longitudinal_force_rises_then_saturates() {
        let mut t = tire();
        let load = 4000.0;
        let peak = t.ideal_slip_ratio(load);

        let mut last = 0.0;
        let mut rising_max = 0.0_f64;
        for i in 1..=100 {
            let slip = peak * (i as f64) / 50.0; // sweep to 2x the peak slip
            let (fx, _) = t.update(load, slip, 0.0);
            assert!(fx.is_finite());
            if slip <= peak {
                assert!(fx >= last - 1e-9, "force must not fall before the peak");
            } else {
                assert!(fx <= rising_max + 1e-9, "force must not exceed the peak");
            }
            rising_max = rising_max.max(fx);
            last = fx;
        }
        // Saturation value is the friction limit, never unbounded.
        let (fx, _) = t.update(load, peak * 50.0, 0.0);
        assert!(fx <= rising_max + 1e-9);
    }

    #[test]
    fn lateral_force_opposes_slip_angle() {
        let mut t = tire();
        let (_, fy) = t.update(4000.0, 0.0, 0.1);
        assert!(fy < 0.0);
        let (_, fy) = t.update(4000.0, 0.0, -0.1);
        assert!(fy > 0.0);
    }

    #[test]
    fn no_load_means_no_force() {
        let mut t = tire();
        assert_eq!(t.update(0.0, 1.0, 0.5), (0.0, 0.0));
    }

    #[test]
    fn combined_slip_respects_the_friction_ellipse() {
        let mut t = tire();
        let load = 4000.0;
        let mu_long = t.effective_friction(t.friction_long, load) * load;
        let mu_lat = t.effective_friction(t.friction_lat, load) * load;
        let (fx, fy) = t.update(load, 1.0, 0.5);
        let demand = (fx / mu_long).hypot(fy / mu_lat);
        assert!(demand <= 1.0 + 1e-9);
    }

    #[test]
    fn friction_degrades_with_load() {
        let t = tire();
        let nominal = t.nominal_load;
        let mu_at_nominal = t.effective_friction(t.friction_long, nominal);
        let mu_overloaded = t.effective_friction(t.friction_long, nominal * 2.0);
        assert!(mu_overloaded < mu_at_nominal);
    }
}
