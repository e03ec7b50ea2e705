// apex_core/src/driveline/engine.rs

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::driveline::torque_curve::TorqueCurve;
use crate::driveline::Shaft;
use crate::error::VehicleError;
use crate::types::{rad_per_sec_to_rpm, rpm_to_rad_per_sec, Vec3};

/// Immutable engine parameters, derived from configuration.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub displacement: f64,
    pub max_power: f64,
    pub redline: f64,
    pub rpm_limit: f64,
    pub rev_limit_hysteresis: f64,
    pub idle_throttle: f64,
    pub start_rpm: f64,
    pub stall_rpm: f64,
    /// kg of fuel per J of combustion work.
    pub fuel_rate: f64,
    /// Friction torque coefficients: constant, linear and quadratic in RPM.
    pub friction: [f64; 3],
    pub inertia: f64,
    pub mass: f64,
    pub position: Vec3,
    pub nos_mass: f64,
    pub nos_boost: f64,
    pub nos_fuel_ratio: f64,
    torque_curve: TorqueCurve,
}

impl EngineInfo {
    pub fn from_config(cfg: &EngineConfig) -> Result<Self, VehicleError> {
        let torque_curve = TorqueCurve::from_points(&cfg.torque_curve)?;

        // Friction coefficients from the Heywood mean-friction-pressure
        // correlation, scaled by displacement.
        let friction = [
            97_000.0 / (4.0 * std::f64::consts::PI) * cfg.displacement,
            15.00 / (4.0 * std::f64::consts::PI) * cfg.displacement,
            0.005 / (4.0 * std::f64::consts::PI) * cfg.displacement,
        ];

        if cfg.efficiency <= 0.0 || cfg.fuel_heating_value <= 0.0 {
            return Err(VehicleError::invalid(
                "engine.efficiency",
                "efficiency and fuel heating value must be positive",
            ));
        }
        let fuel_rate = 1.0 / (cfg.efficiency * cfg.fuel_heating_value);

        let mut info = Self {
            displacement: cfg.displacement,
            max_power: cfg.max_power,
            redline: cfg.redline,
            rpm_limit: cfg.rpm_limit,
            rev_limit_hysteresis: cfg.rev_limit_hysteresis,
            idle_throttle: 0.0,
            start_rpm: cfg.start_rpm,
            stall_rpm: cfg.stall_rpm,
            fuel_rate,
            friction,
            inertia: cfg.inertia,
            mass: cfg.mass,
            position: Vec3::new(cfg.position[0], cfg.position[1], cfg.position[2]),
            nos_mass: cfg.nos_mass,
            nos_boost: cfg.nos_boost,
            nos_fuel_ratio: cfg.nos_fuel_ratio,
            torque_curve,
        };

        // Idle throttle: the smallest opening that holds the engine at the
        // start RPM against its own friction, unless configured explicitly.
        info.idle_throttle = match cfg.idle {
            Some(idle) => idle.clamp(0.0, 1.0),
            None => {
                let mut idle = 0.0;
                while idle < 1.0 {
                    if info.torque(idle, info.start_rpm) > -info.friction_torque(idle, info.start_rpm)
                    {
                        break;
                    }
                    idle += 0.01;
                }
                idle
            }
        };

        Ok(info)
    }

    /// Combustion torque at the given throttle opening and RPM.
    pub fn torque(&self, throttle: f64, rpm: f64) -> f64 {
        if rpm < 1.0 {
            return 0.0;
        }
        self.torque_curve.torque(rpm) * throttle
    }

    /// Friction torque, negative against the direction of rotation. Off
    /// throttle the full friction applies; at full throttle it is folded
    /// into the measured torque curve.
    pub fn friction_torque(&self, throttle: f64, rpm: f64) -> f64 {
        let sign = if rpm < 0.0 { -1.0 } else { 1.0 };
        let rpm = sign * rpm;
        let friction =
            self.friction[0] + self.friction[1] * rpm + self.friction[2] * rpm * rpm;
        -sign * friction * (1.0 - throttle)
    }
}

/// The minimal engine state persisted for save/replay/network sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSaveState {
    pub shaft_ang_velocity: f64,
    pub throttle_position: f64,
    pub clutch_torque: f64,
    pub out_of_fuel: bool,
    pub rev_limit_exceeded: bool,
}

/// Rotational-shaft engine model: combustion, friction and clutch torque
/// integrated into crankshaft angular velocity once per tick.
#[derive(Debug, Clone)]
pub struct Engine {
    info: EngineInfo,
    shaft: Shaft,
    combustion_torque: f64,
    friction_torque: f64,
    clutch_torque: f64,
    throttle_position: f64,
    nos_boost_factor: f64,
    nos_mass: f64,
    out_of_fuel: bool,
    rev_limit_exceeded: bool,
    stalled: bool,
}

impl Engine {
    pub fn new(info: EngineInfo) -> Self {
        let shaft = Shaft::new(info.inertia);
        let nos_mass = info.nos_mass;
        Self {
            info,
            shaft,
            combustion_torque: 0.0,
            friction_torque: 0.0,
            clutch_torque: 0.0,
            throttle_position: 0.0,
            nos_boost_factor: 0.0,
            nos_mass,
            out_of_fuel: false,
            rev_limit_exceeded: false,
            stalled: true,
        }
    }

    pub fn info(&self) -> &EngineInfo {
        &self.info
    }

    /// Spins the crank up to the start RPM.
    pub fn start(&mut self) {
        self.shaft
            .set_ang_velocity(rpm_to_rad_per_sec(self.info.start_rpm));
        self.stalled = false;
    }

    pub fn rpm(&self) -> f64 {
        rad_per_sec_to_rpm(self.shaft.ang_velocity())
    }

    pub fn ang_velocity(&self) -> f64 {
        self.shaft.ang_velocity()
    }

    pub fn set_throttle(&mut self, value: f64) {
        self.throttle_position = value.clamp(0.0, 1.0);
    }

    pub fn throttle(&self) -> f64 {
        self.throttle_position
    }

    /// Nitrous injection factor in [0, 1]; zero disables boost.
    pub fn set_nitrous(&mut self, factor: f64) {
        self.nos_boost_factor = factor.clamp(0.0, 1.0);
    }

    pub fn nitrous_mass(&self) -> f64 {
        self.nos_mass
    }

    pub fn set_out_of_fuel(&mut self, value: bool) {
        self.out_of_fuel = value;
    }

    pub fn is_out_of_fuel(&self) -> bool {
        self.out_of_fuel
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn is_rev_limited(&self) -> bool {
        self.rev_limit_exceeded
    }

    pub fn combustion_torque(&self) -> f64 {
        self.combustion_torque
    }

    pub fn clutch_torque(&self) -> f64 {
        self.clutch_torque
    }

    /// Net shaft torque from the last integration step.
    pub fn torque(&self) -> f64 {
        self.combustion_torque + self.friction_torque
    }

    /// Fuel consumption in kg/s at the current operating point.
    pub fn fuel_consumption(&self) -> f64 {
        let power = self.combustion_torque * self.shaft.ang_velocity();
        power.abs() * self.info.fuel_rate
    }

    /// Advances the crank by one step under the requested clutch drag.
    ///
    /// The clutch torque is clamped to the momentum available over `dt`, a
    /// numerical-stability bound that keeps the coupling from reversing the
    /// crank within one step. Returns the clutch torque actually applied.
    pub fn integrate(&mut self, clutch_drag: f64, clutch_ang_velocity: f64, dt: f64) -> f64 {
        let rpm = self.rpm();

        self.clutch_torque = clutch_drag;
        let torque_limit = self.shaft.momentum(clutch_ang_velocity) / dt;
        if (self.clutch_torque > 0.0 && self.clutch_torque > torque_limit)
            || (self.clutch_torque < 0.0 && self.clutch_torque < torque_limit)
        {
            self.clutch_torque = torque_limit;
        }

        self.stalled = rpm < self.info.stall_rpm;

        // Make sure the throttle is at least idling.
        if self.throttle_position < self.info.idle_throttle {
            self.throttle_position = self.info.idle_throttle;
        }

        // Soft rev limiter with hysteresis so it does not chatter.
        let mut rev_limit = self.info.rpm_limit;
        if self.rev_limit_exceeded {
            rev_limit -= self.info.rev_limit_hysteresis;
        }
        self.rev_limit_exceeded = rpm > rev_limit;

        self.combustion_torque = self.info.torque(self.throttle_position, rpm);

        // Nitrous injection.
        if self.nos_mass > 0.0 && self.nos_boost_factor > 0.0 {
            let boost = self.nos_boost_factor * self.info.nos_boost;
            let ang_velocity = self.shaft.ang_velocity();
            if ang_velocity > 1.0 {
                self.combustion_torque += boost / ang_velocity;
            }

            let fuel_consumed = boost * self.info.fuel_rate * dt;
            let nos_consumed = self.info.nos_fuel_ratio * fuel_consumed;
            self.nos_mass = (self.nos_mass - nos_consumed).max(0.0);
        }

        if self.out_of_fuel || self.rev_limit_exceeded || self.stalled {
            self.combustion_torque = 0.0;
        }

        self.friction_torque = self.info.friction_torque(self.throttle_position, rpm);

        // Static friction of a stopped engine.
        if self.stalled {
            self.friction_torque *= 2.0;
        }

        let total_torque = self.combustion_torque + self.friction_torque + self.clutch_torque;
        self.shaft.apply_torque(total_torque, dt);

        self.clutch_torque
    }

    pub fn save_state(&self) -> EngineSaveState {
        EngineSaveState {
            shaft_ang_velocity: self.shaft.ang_velocity(),
            throttle_position: self.throttle_position,
            clutch_torque: self.clutch_torque,
            out_of_fuel: self.out_of_fuel,
            rev_limit_exceeded: self.rev_limit_exceeded,
        }
    }

    pub fn restore_state(&mut self, state: &EngineSaveState) {
        self.shaft.set_ang_velocity(state.shaft_ang_velocity);
        self.throttle_position = state.throttle_position;
        self.clutch_torque = state.clutch_torque;
        self.out_of_fuel = state.out_of_fuel;
        self.rev_limit_exceeded = state.rev_limit_exceeded;
        self.stalled = self.rpm() < self.info.stall_rpm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_config;
    use approx::assert_relative_eq;

    fn engine() -> Engine {
        let info = EngineInfo::from_config(&sample_config().engine).unwrap();
        Engine::new(info)
    }

    #[test]
    fn starter_spins_to_start_rpm() {
        let mut e = engine();
        assert!(e.is_stalled());
        e.start();
        assert_relative_eq!(e.rpm(), e.info().start_rpm, epsilon = 1e-9);
        assert!(!e.is_stalled());
    }

    #[test]
    fn rev_limiter_cuts_and_holds_through_hysteresis() {
        let mut e = engine();
        e.start();
        e.set_throttle(1.0);
        let limit = e.info().rpm_limit;
        let hysteresis = e.info().rev_limit_hysteresis;

        // Push past the limit: the first step past it trips the flag, the
        // following step produces zero combustion torque.
        e.shaft.set_ang_velocity(rpm_to_rad_per_sec(limit + 50.0));
        e.integrate(0.0, 0.0, 0.005);
        assert!(e.is_rev_limited());
        e.shaft.set_ang_velocity(rpm_to_rad_per_sec(limit + 50.0));
        e.integrate(0.0, 0.0, 0.005);
        assert_eq!(e.combustion_torque(), 0.0);

        // Inside the hysteresis band the limiter stays engaged.
        e.shaft
            .set_ang_velocity(rpm_to_rad_per_sec(limit - hysteresis * 0.5));
        e.integrate(0.0, 0.0, 0.005);
        assert!(e.is_rev_limited());

        // Below the band it releases and combustion returns.
        e.shaft
            .set_ang_velocity(rpm_to_rad_per_sec(limit - hysteresis - 50.0));
        e.integrate(0.0, 0.0, 0.005);
        assert!(!e.is_rev_limited());
        e.shaft
            .set_ang_velocity(rpm_to_rad_per_sec(limit - hysteresis - 50.0));
        e.integrate(0.0, 0.0, 0.005);
        assert!(e.combustion_torque() > 0.0);
    }

    #[test]
    fn nitrous_mass_never_increases_and_floors_at_zero() {
        let mut e = engine();
        e.start();
        e.set_throttle(1.0);
        e.set_nitrous(1.0);
        let mut last = e.nitrous_mass();
        for _ in 0..20_000 {
            e.integrate(0.0, 0.0, 0.01);
            let now = e.nitrous_mass();
            assert!(now <= last);
            assert!(now >= 0.0);
            last = now;
        }
    }

    #[test]
    fn clutch_torque_is_momentum_bounded() {
        let mut e = engine();
        e.start();
        let dt = 0.01;
        // An absurd drag torque must not yank the crank past the clutch speed.
        let target = rpm_to_rad_per_sec(500.0);
        let applied = e.integrate(-1.0e9, target, dt);
        assert!(applied.abs() < 1.0e9);
        // The clutch alone cannot push the crank past the clutch speed;
        // only the engine's own friction moves it slightly further.
        assert!(e.ang_velocity() >= target - 2.0);
    }

    #[test]
    fn out_of_fuel_zeroes_combustion() {
        let mut e = engine();
        e.start();
        e.set_throttle(1.0);
        e.set_out_of_fuel(true);
        e.integrate(0.0, 0.0, 0.01);
        assert_eq!(e.combustion_torque(), 0.0);
    }

    #[test]
    fn save_state_round_trips() {
        let mut e = engine();
        e.start();
        e.set_throttle(0.7);
        for _ in 0..100 {
            e.integrate(-20.0, e.ang_velocity() * 0.9, 0.01);
        }
        let saved = e.save_state();

        let mut restored = engine();
        restored.restore_state(&saved);
        assert_eq!(restored.save_state(), saved);
        assert_relative_eq!(restored.rpm(), e.rpm());
    }
}
