// apex_core/src/vehicle/control.rs

//! Driveline update, the shift state machine, auto-clutch and the ABS/TCS
//! threshold controllers.

use super::VehicleDynamics;
use crate::types::{rad_per_sec_to_rpm, Drive, WheelPosition};

/// Pedal position below which TCS stays out of the loop.
const TCS_GAS_THRESHOLD: f64 = 0.1;
/// Pedal position below which ABS stays out of the loop.
const ABS_BRAKE_THRESHOLD: f64 = 0.1;
/// Minimum wheel speed (rad/s) for ABS to engage; parking brakes may lock.
const ABS_MIN_WHEEL_SPEED: f64 = 6.0;
/// Minimum wheel-to-wheel spin difference (rad/s) for TCS to engage.
const TCS_MIN_SPIN_DIFF: f64 = 1.0;
/// Proportional gain of the TCS throttle correction.
const TCS_GAIN: f64 = 10.0;
/// 1/seconds; how fast the auto clutch moves toward its target.
const AUTO_CLUTCH_RATE: f64 = 10.0;

impl VehicleDynamics {
    /// Engine -> clutch -> transmission -> differential(s) -> per-wheel
    /// drive torque, including the TCS throttle correction and fuel burn.
    pub(crate) fn update_driveline(
        &mut self,
        drive_torque: &mut [f64; 4],
        normal_forces: &[f64; 4],
        dt: f64,
    ) {
        self.update_transmission(dt);

        if self.tcs_enabled {
            for i in 0..4 {
                if self.wheel_driven(i) {
                    self.do_tcs(i, normal_forces[i]);
                } else {
                    self.tcs_active[i] = false;
                }
            }
        } else {
            self.tcs_active = [false; 4];
        }

        let driveshaft_speed = self.driveshaft_speed();
        let clutch_speed = self.transmission.clutch_speed(driveshaft_speed);
        self.driveshaft_rpm = rad_per_sec_to_rpm(clutch_speed);

        let mut clutch_drag = self
            .clutch
            .torque(self.engine.ang_velocity(), clutch_speed);
        if self.transmission.gear() == 0 {
            // Neutral decouples the shafts entirely.
            clutch_drag = 0.0;
        }
        let clutch_drag = self.engine.integrate(clutch_drag, clutch_speed, dt);

        self.calculate_drive_torque(drive_torque, -clutch_drag);

        self.fuel_tank.consume(self.engine.fuel_consumption() * dt);
        self.engine.set_out_of_fuel(self.fuel_tank.is_empty());
    }

    /// Driveshaft speed consistent with the driven wheels' average, through
    /// the configured differential chain.
    fn driveshaft_speed(&mut self) -> f64 {
        let fl = self.wheels[WheelPosition::FrontLeft.index()].ang_velocity();
        let fr = self.wheels[WheelPosition::FrontRight.index()].ang_velocity();
        let rl = self.wheels[WheelPosition::RearLeft.index()].ang_velocity();
        let rr = self.wheels[WheelPosition::RearRight.index()].ang_velocity();

        match self.drive {
            Drive::None => 0.0,
            Drive::Front => self
                .differential_front
                .as_mut()
                .map(|d| d.driveshaft_speed(fl, fr))
                .unwrap_or(0.0),
            Drive::Rear => self
                .differential_rear
                .as_mut()
                .map(|d| d.driveshaft_speed(rl, rr))
                .unwrap_or(0.0),
            Drive::All => {
                let front = self
                    .differential_front
                    .as_mut()
                    .map(|d| d.driveshaft_speed(fl, fr))
                    .unwrap_or(0.0);
                let rear = self
                    .differential_rear
                    .as_mut()
                    .map(|d| d.driveshaft_speed(rl, rr))
                    .unwrap_or(0.0);
                self.differential_center
                    .as_mut()
                    .map(|d| d.driveshaft_speed(front, rear))
                    .unwrap_or(0.0)
            }
        }
    }

    /// Splits the clutch reaction torque down the differential chain into
    /// per-wheel drive torque.
    fn calculate_drive_torque(&mut self, drive_torque: &mut [f64; 4], clutch_torque: f64) {
        let driveshaft_torque = self.transmission.torque(clutch_torque);
        *drive_torque = [0.0; 4];

        match self.drive {
            Drive::None => {}
            Drive::Front => {
                if let Some(d) = self.differential_front.as_mut() {
                    d.compute_wheel_torques(driveshaft_torque);
                    drive_torque[WheelPosition::FrontLeft.index()] = d.side1_torque();
                    drive_torque[WheelPosition::FrontRight.index()] = d.side2_torque();
                }
            }
            Drive::Rear => {
                if let Some(d) = self.differential_rear.as_mut() {
                    d.compute_wheel_torques(driveshaft_torque);
                    drive_torque[WheelPosition::RearLeft.index()] = d.side1_torque();
                    drive_torque[WheelPosition::RearRight.index()] = d.side2_torque();
                }
            }
            Drive::All => {
                let (front_in, rear_in) = match self.differential_center.as_mut() {
                    Some(center) => {
                        center.compute_wheel_torques(driveshaft_torque);
                        (center.side1_torque(), center.side2_torque())
                    }
                    None => (0.0, 0.0),
                };
                if let Some(d) = self.differential_front.as_mut() {
                    d.compute_wheel_torques(front_in);
                    drive_torque[WheelPosition::FrontLeft.index()] = d.side1_torque();
                    drive_torque[WheelPosition::FrontRight.index()] = d.side2_torque();
                }
                if let Some(d) = self.differential_rear.as_mut() {
                    d.compute_wheel_torques(rear_in);
                    drive_torque[WheelPosition::RearLeft.index()] = d.side1_torque();
                    drive_torque[WheelPosition::RearRight.index()] = d.side2_torque();
                }
            }
        }
    }

    // --- Shift state machine ---

    /// Requests a gear change, honored at the next valid tick boundary.
    /// Ignored mid-shift and for out-of-range gears.
    pub fn shift_gear(&mut self, gear: i32) {
        if gear == self.transmission.gear() || self.is_shifting() {
            return;
        }
        if gear <= self.transmission.forward_gears() && gear >= -self.transmission.reverse_gears() {
            self.remaining_shift_time = self.transmission.shift_time();
            self.shift_target = gear;
            self.shifted = false;
        }
    }

    pub fn is_shifting(&self) -> bool {
        !self.shifted || self.remaining_shift_time > 0.0
    }

    pub fn remaining_shift_time(&self) -> f64 {
        self.remaining_shift_time
    }

    /// Throttle, clutch and gear for this tick: the {not shifting,
    /// shifting} state machine plus auto-shift/auto-clutch.
    pub(crate) fn update_transmission(&mut self, dt: f64) {
        if self.auto_shift && !self.is_shifting() {
            let next = self.next_gear();
            if next != self.transmission.gear() {
                self.shift_gear(next);
            }
        }

        if self.remaining_shift_time > 0.0 {
            self.remaining_shift_time = (self.remaining_shift_time - dt).max(0.0);
        }
        // The gear physically changes at the point of the clutch curve
        // where the plates are fully open.
        if !self.shifted
            && self.remaining_shift_time <= 0.5 * self.transmission.shift_time()
        {
            self.transmission.shift(self.shift_target);
            self.shifted = true;
        }

        if self.auto_clutch {
            if self.engine.is_stalled() {
                self.engine.start();
            }
            let throttle = self.shift_auto_clutch_throttle(self.throttle_input, dt);
            self.engine.set_throttle(throttle);

            let target = self.auto_clutch_target();
            let blend = (dt * AUTO_CLUTCH_RATE).min(1.0);
            let value = self.last_auto_clutch + (target - self.last_auto_clutch) * blend;
            self.last_auto_clutch = value;
            self.clutch.set_engagement(value * self.shift_auto_clutch());
        } else {
            self.engine.set_throttle(self.throttle_input);
            self.clutch.set_engagement(self.clutch_input);
        }
    }

    /// Upshift past the redline; downshift below the per-gear threshold.
    fn next_gear(&self) -> i32 {
        let gear = self.transmission.gear();
        if gear > 0 {
            let rpm = self.engine.rpm();
            if rpm > self.engine.info().redline && gear < self.transmission.forward_gears() {
                return gear + 1;
            }
            if gear > 1 && rpm < self.downshift_rpm(gear) {
                return gear - 1;
            }
        }
        gear
    }

    /// Downshift point chosen so the shift into the lower gear does not
    /// immediately re-trigger an upshift.
    fn downshift_rpm(&self, gear: i32) -> f64 {
        if gear > 1 {
            let current = self.transmission.ratio(gear);
            let lower = self.transmission.ratio(gear - 1);
            0.7 * self.engine.info().redline * current / lower
        } else {
            0.0
        }
    }

    /// Time-based disengage/re-engage curve over the shift duration.
    fn shift_auto_clutch(&self) -> f64 {
        let half = 0.5 * self.transmission.shift_time();
        if self.remaining_shift_time > half {
            0.0
        } else if self.remaining_shift_time > 0.0 {
            1.0 - self.remaining_shift_time / half
        } else {
            1.0
        }
    }

    /// Throttle shaping while shifting: blip to spin the engine up to the
    /// new gear's shaft speed, otherwise cut to half to smooth the torque
    /// transition.
    fn shift_auto_clutch_throttle(&mut self, throttle: f64, dt: f64) -> f64 {
        if self.remaining_shift_time > 0.0 {
            if self.engine.rpm() < self.driveshaft_rpm
                && self.engine.rpm() < self.engine.info().redline
            {
                // Not synchronized yet; hold the shift open a little longer.
                self.remaining_shift_time = (self.remaining_shift_time + dt)
                    .min(0.5 * self.transmission.shift_time());
                return 1.0;
            }
            return 0.5 * throttle;
        }
        throttle
    }

    /// Continuous engagement target that keeps the engine above its stall
    /// region; fully opens when the driven wheels are about to lock under
    /// braking.
    fn auto_clutch_target(&self) -> f64 {
        if self.drive != Drive::None {
            let mut driven_will_lock = true;
            for i in 0..4 {
                if self.wheel_driven(i) {
                    driven_will_lock &= self.brakes[i].will_lock();
                }
            }
            if driven_will_lock {
                return 0.0;
            }
        }

        let info = self.engine.info();
        let rpm = self.engine.rpm();
        if rpm < info.stall_rpm {
            return 0.0;
        }
        ((rpm - info.stall_rpm) / (info.start_rpm - info.stall_rpm)).clamp(0.0, 1.0)
    }

    // --- Traction control ---

    /// Proportional threshold controller: engage when this wheel's forward
    /// slip exceeds the tire's ideal slip, release half an ideal-slip below,
    /// and pull throttle proportionally while active.
    pub(crate) fn do_tcs(&mut self, i: usize, normal_force: f64) {
        let gas = self.engine.throttle();
        if gas <= TCS_GAS_THRESHOLD {
            self.tcs_active[i] = false;
            return;
        }

        // Only react when this wheel actually spins against the others.
        let speed = self.wheels[i].ang_velocity();
        let max_spin_diff = self
            .wheels
            .iter()
            .map(|w| (speed - w.ang_velocity()).abs())
            .fold(0.0, f64::max);
        if max_spin_diff <= TCS_MIN_SPIN_DIFF {
            self.tcs_active[i] = false;
            return;
        }

        let sense = if self.transmission.gear() < 0 { -1.0 } else { 1.0 };
        let ideal = self.tires[i].ideal_slip_ratio(normal_force);
        let error = self.tires[i].slip_ratio() * sense - ideal;

        if error > 0.0 {
            self.tcs_active[i] = true;
        } else if error < -0.5 * ideal {
            self.tcs_active[i] = false;
        }

        if self.tcs_active[i] {
            let engagement = self.clutch.engagement().clamp(0.0, 1.0);
            let corrected = (gas - error * TCS_GAIN * engagement).clamp(0.0, 1.0);
            self.engine.set_throttle(corrected);
        }
    }

    /// Proportional threshold controller on the brake side: a wheel turning
    /// far slower than the ground is locking, so its brake factor is zeroed
    /// for this tick.
    pub(crate) fn do_abs(&mut self, i: usize, normal_force: f64) {
        if self.brake_input <= ABS_BRAKE_THRESHOLD {
            self.abs_active[i] = false;
            return;
        }

        let max_speed = self
            .wheels
            .iter()
            .map(|w| w.ang_velocity())
            .fold(0.0, f64::max);
        if max_speed > ABS_MIN_WHEEL_SPEED {
            let ideal = self.tires[i].ideal_slip_ratio(normal_force);
            let error = -self.tires[i].slip_ratio() - ideal;
            if error > 0.0 {
                self.abs_active[i] = true;
            } else if error < -0.5 * ideal {
                self.abs_active[i] = false;
            }
        } else {
            self.abs_active[i] = false;
        }

        if self.abs_active[i] {
            self.brakes[i].set_brake_factor(0.0);
        }
    }
}
