// apex_sim/src/runner.rs

//! The host loop: a scripted launch-and-stop drive over the flat ground,
//! advanced at the host frame rate with the physics running fixed steps
//! inside each frame.

use apex_core::abstractions::RigidBody as _;
use apex_core::prelude::{SavedState, VehicleConfig, VehicleDynamics, VehicleError, WheelPosition};
use apex_core::types::Vec3;

use crate::config::Simulation;
use crate::world::{FlatGround, SimBody};

/// End-of-run figures printed by the binary.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub top_speed: f64,
    pub distance: f64,
    pub final_gear: i32,
    pub final_rpm: f64,
    pub fuel_fraction: f64,
}

pub struct Runner {
    vehicle: VehicleDynamics,
    world: FlatGround,
    body: SimBody,
    settings: Simulation,
}

impl Runner {
    pub fn new(settings: Simulation, car: &VehicleConfig) -> Result<Self, VehicleError> {
        let world = FlatGround::new(0.0);
        let gravity = Vec3::new(
            settings.gravity[0],
            settings.gravity[1],
            settings.gravity[2],
        );
        let mut body = SimBody::new(Vec3::new(0.0, 0.0, settings.spawn_height), gravity);
        let vehicle = VehicleDynamics::new(car, &mut body)?;
        Ok(Self {
            vehicle,
            world,
            body,
            settings,
        })
    }

    pub fn restore(&mut self, state: &SavedState) {
        self.vehicle.restore_state(state);
    }

    pub fn saved_state(&self) -> SavedState {
        self.vehicle.save_state()
    }

    /// Scripted drive: settle, launch at full throttle with the automatics
    /// and both traction aids on, then brake to a stop for the last quarter
    /// of the run.
    pub fn run(&mut self) -> Summary {
        let dt = 1.0 / self.settings.step_hz;
        let frame = 1.0 / self.settings.frame_hz;
        let duration = self.settings.duration_seconds;
        let brake_point = duration * 0.75;

        self.vehicle.set_abs(true);
        self.vehicle.set_tcs(true);
        self.vehicle.set_auto_clutch(true);
        self.vehicle.set_auto_shift(true);
        self.vehicle.align_with_ground(&self.world, &mut self.body);
        self.vehicle.start_engine();
        self.vehicle.shift_gear(1);

        let start = self.body.transform().translation.vector;
        let mut summary = Summary::default();
        let mut time = 0.0;
        let mut next_report = 0.0;

        while time < duration {
            if time < brake_point {
                self.vehicle.set_throttle(1.0);
                self.vehicle.set_brake(0.0);
            } else {
                self.vehicle.set_throttle(0.0);
                self.vehicle.set_brake(1.0);
            }

            self.vehicle
                .advance(&self.world, &mut self.body, frame, dt);
            time += frame;

            summary.top_speed = summary.top_speed.max(self.vehicle.forward_speed());

            if time >= next_report {
                self.report(time);
                next_report += 1.0;
            }
        }

        summary.distance = (self.body.transform().translation.vector - start).norm();
        summary.final_gear = self.vehicle.gear();
        summary.final_rpm = self.vehicle.rpm();
        summary.fuel_fraction = self.vehicle.fuel_tank().fill_fraction();
        summary
    }

    fn report(&self, time: f64) {
        let aids = format!(
            "{}{}",
            if self.vehicle.any_tcs_active() { "T" } else { "-" },
            if self.vehicle.any_abs_active() { "A" } else { "-" },
        );
        println!(
            "t={:5.1}s  v={:6.2} m/s  rpm={:5.0} (tacho {:5.0})  gear={:2}  aids={}  slip_rr={:+.2}",
            time,
            self.vehicle.forward_speed(),
            self.vehicle.rpm(),
            self.vehicle.tacho_rpm(),
            self.vehicle.gear(),
            aids,
            self.vehicle.tire(WheelPosition::RearRight).slip_ratio(),
        );
    }

    pub fn vehicle(&self) -> &VehicleDynamics {
        &self.vehicle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Simulation;

    fn short_settings() -> Simulation {
        Simulation {
            duration_seconds: 4.0,
            ..Simulation::default()
        }
    }

    // A compact car description; the asset files carry the full-size ones.
    fn car() -> VehicleConfig {
        let text = include_str!("../assets/cars/club_gt.toml");
        toml::from_str(text).expect("bundled car must parse")
    }

    #[test]
    fn bundled_car_builds_and_drives() {
        let mut runner = Runner::new(short_settings(), &car()).expect("runner must build");
        let summary = runner.run();
        assert!(summary.top_speed > 5.0, "car never moved: {summary:?}");
        assert!(summary.distance > 10.0);
        assert!(summary.fuel_fraction < 1.0, "fuel must be consumed");
    }

    #[test]
    fn saved_state_survives_a_toml_round_trip() {
        let mut runner = Runner::new(short_settings(), &car()).unwrap();
        runner.run();
        let state = runner.saved_state();
        let text = toml::to_string(&state).expect("state must serialize");
        let restored: apex_core::prelude::SavedState =
            toml::from_str(&text).expect("state must deserialize");
        assert_eq!(restored, state);
    }
}
