// apex_core/src/vehicle/mod.rs

//! The orchestrator: owns every driveline and corner component, mirrors the
//! external rigid body, and runs the fixed-step tick.

mod control;
mod tick;

use std::fmt::Write as _;
use std::sync::Arc;

use nalgebra::Isometry3;

use crate::abstractions::{CollisionWorld, ContactSample, RigidBody};
use crate::chassis::aero::AeroDevice;
use crate::chassis::brake::Brake;
use crate::chassis::suspension::Suspension;
use crate::chassis::tire::Tire;
use crate::chassis::wheel::Wheel;
use crate::config::VehicleConfig;
use crate::driveline::clutch::Clutch;
use crate::driveline::differential::Differential;
use crate::driveline::engine::{Engine, EngineInfo, EngineSaveState};
use crate::driveline::fuel_tank::FuelTank;
use crate::driveline::transmission::Transmission;
use crate::error::VehicleError;
use crate::snapshot::{InterpolatedState, StateSnapshots};
use crate::types::{Drive, Mat3, Quat, Vec3, WheelPosition, WorldPoint};

/// The minimal state persisted for save/replay/network sync. Restoring it
/// on an identically configured vehicle with the same external body
/// transform resumes the simulation deterministically.
pub type SavedState = EngineSaveState;

/// Aggregated mass data computed once from the vehicle's mass particles
/// (chassis, engine, fuel, wheels).
#[derive(Debug, Clone)]
pub struct MassProperties {
    pub mass: f64,
    /// Center of mass in the body frame.
    pub center_of_mass: Vec3,
    /// Inertia tensor about the center of mass, body frame.
    pub inertia: Mat3,
}

/// Cached copy of the external body state, refreshed around each tick. The
/// external engine remains the sole arbiter of the real transform.
#[derive(Debug, Clone)]
struct BodyMirror {
    transform: Isometry3<f64>,
    prev_transform: Isometry3<f64>,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    inv_mass: f64,
}

impl BodyMirror {
    fn new(transform: Isometry3<f64>) -> Self {
        Self {
            transform,
            prev_transform: transform,
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            inv_mass: 0.0,
        }
    }
}

pub struct VehicleDynamics {
    // Fixed configuration.
    drive: Drive,
    /// Steering lock in radians.
    max_steering_angle: f64,

    // Driveline.
    engine: Engine,
    fuel_tank: FuelTank,
    clutch: Clutch,
    transmission: Transmission,
    differential_front: Option<Differential>,
    differential_rear: Option<Differential>,
    differential_center: Option<Differential>,

    // Corners, indexed by WheelPosition.
    wheels: [Wheel; 4],
    tires: [Tire; 4],
    brakes: [Brake; 4],
    suspensions: [Suspension; 4],

    aerodynamics: Vec<AeroDevice>,

    mass_properties: MassProperties,
    body: BodyMirror,

    // Per-wheel transient state, world frame.
    wheel_contacts: [Option<ContactSample>; 4],
    wheel_velocity: [Vec3; 4],
    wheel_position: [WorldPoint; 4],
    wheel_orientation: [Quat; 4],
    wheel_spin_angle: [f64; 4],

    // Driver inputs, all normalized.
    throttle_input: f64,
    brake_input: f64,
    handbrake_input: f64,
    clutch_input: f64,
    steering_input: f64,
    /// Steering angle at the front wheels, radians.
    steering_angle: f64,

    // Driveline control state.
    driveshaft_rpm: f64,
    tacho_rpm: f64,
    auto_clutch: bool,
    auto_shift: bool,
    shifted: bool,
    shift_target: i32,
    remaining_shift_time: f64,
    last_auto_clutch: f64,

    // Traction control state.
    abs_enabled: bool,
    tcs_enabled: bool,
    abs_active: [bool; 4],
    tcs_active: [bool; 4],

    feedback: f64,
    total_aero_force: Vec3,

    // Fixed stepping.
    accumulator: f64,

    snapshots: Arc<StateSnapshots>,
}

impl VehicleDynamics {
    /// Builds the full vehicle from a validated configuration and installs
    /// the aggregated mass properties on the external body. Fails closed:
    /// a rejected config constructs nothing.
    pub fn new(config: &VehicleConfig, body: &mut dyn RigidBody) -> Result<Self, VehicleError> {
        config.validate()?;

        let engine = Engine::new(EngineInfo::from_config(&config.engine)?);
        let fuel_tank = FuelTank::from_config(&config.fuel_tank)?;
        let clutch = Clutch::from_config(&config.clutch)?;
        let transmission = Transmission::from_config(&config.transmission)?;

        let differential_front = config
            .differential_front
            .as_ref()
            .map(Differential::from_config)
            .transpose()?;
        let differential_rear = config
            .differential_rear
            .as_ref()
            .map(Differential::from_config)
            .transpose()?;
        let differential_center = config
            .differential_center
            .as_ref()
            .map(Differential::from_config)
            .transpose()?;

        // FL, FR, RL, RR; the right side mirrors the suspension attachment.
        let wheels = [
            Wheel::from_config(&config.front.wheel)?,
            Wheel::from_config(&config.front.wheel)?,
            Wheel::from_config(&config.rear.wheel)?,
            Wheel::from_config(&config.rear.wheel)?,
        ];
        let tires = [
            Tire::from_config(&config.front.tire)?,
            Tire::from_config(&config.front.tire)?,
            Tire::from_config(&config.rear.tire)?,
            Tire::from_config(&config.rear.tire)?,
        ];
        let brakes = [
            Brake::from_config(&config.front.brake)?,
            Brake::from_config(&config.front.brake)?,
            Brake::from_config(&config.rear.brake)?,
            Brake::from_config(&config.rear.brake)?,
        ];
        let suspensions = [
            Suspension::from_config(&config.front.suspension, false)?,
            Suspension::from_config(&config.front.suspension, true)?,
            Suspension::from_config(&config.rear.suspension, false)?,
            Suspension::from_config(&config.rear.suspension, true)?,
        ];

        let aerodynamics = config
            .aerodynamics
            .iter()
            .map(AeroDevice::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        // Mass particles: chassis + engine + fuel + wheels.
        let mut particles: Vec<(f64, Vec3)> = vec![
            (
                config.body.mass,
                Vec3::new(
                    config.body.position[0],
                    config.body.position[1],
                    config.body.position[2],
                ),
            ),
            (engine.info().mass, engine.info().position),
            (fuel_tank.fuel_mass(), fuel_tank.position()),
        ];
        for (wheel, suspension) in wheels.iter().zip(suspensions.iter()) {
            particles.push((wheel.mass(), suspension.attachment()));
        }
        let mass_properties = Self::calculate_mass(&particles);
        body.set_mass_properties(
            mass_properties.mass,
            mass_properties.center_of_mass,
            mass_properties.inertia,
        );

        let transform = body.transform();
        let mut vehicle = Self {
            drive: config.drive,
            max_steering_angle: config.max_steering_angle.to_radians(),
            engine,
            fuel_tank,
            clutch,
            transmission,
            differential_front,
            differential_rear,
            differential_center,
            wheels,
            tires,
            brakes,
            suspensions,
            aerodynamics,
            mass_properties,
            body: BodyMirror::new(transform),
            wheel_contacts: [None, None, None, None],
            wheel_velocity: [Vec3::zeros(); 4],
            wheel_position: [WorldPoint::origin(); 4],
            wheel_orientation: [Quat::identity(); 4],
            wheel_spin_angle: [0.0; 4],
            throttle_input: 0.0,
            brake_input: 0.0,
            handbrake_input: 0.0,
            clutch_input: 1.0,
            steering_input: 0.0,
            steering_angle: 0.0,
            driveshaft_rpm: 0.0,
            tacho_rpm: 0.0,
            auto_clutch: true,
            auto_shift: true,
            shifted: true,
            shift_target: 0,
            remaining_shift_time: 0.0,
            last_auto_clutch: 1.0,
            abs_enabled: false,
            tcs_enabled: false,
            abs_active: [false; 4],
            tcs_active: [false; 4],
            feedback: 0.0,
            total_aero_force: Vec3::zeros(),
            accumulator: 0.0,
            snapshots: Arc::new(StateSnapshots::new(InterpolatedState::default())),
        };
        vehicle.update_wheel_transforms(0.0);
        vehicle.publish_snapshot(1.0);
        Ok(vehicle)
    }

    /// Weighted centroid and point-mass inertia tensor of a particle set.
    fn calculate_mass(particles: &[(f64, Vec3)]) -> MassProperties {
        let mass: f64 = particles.iter().map(|(m, _)| m).sum();
        let center_of_mass = particles
            .iter()
            .fold(Vec3::zeros(), |acc, (m, p)| acc + p * *m)
            / mass;

        let mut inertia = Mat3::zeros();
        for (m, p) in particles {
            let r = p - center_of_mass;
            inertia += (Mat3::identity() * r.norm_squared() - r * r.transpose()) * *m;
        }
        MassProperties {
            mass,
            center_of_mass,
            inertia,
        }
    }

    // --- Runtime control surface ---

    pub fn set_throttle(&mut self, value: f64) {
        self.throttle_input = value.clamp(0.0, 1.0);
    }

    pub fn set_brake(&mut self, value: f64) {
        self.brake_input = value.clamp(0.0, 1.0);
    }

    pub fn set_handbrake(&mut self, value: f64) {
        self.handbrake_input = value.clamp(0.0, 1.0);
    }

    /// Manual clutch engagement; ignored while auto-clutch is on.
    pub fn set_clutch(&mut self, value: f64) {
        self.clutch_input = value.clamp(0.0, 1.0);
    }

    /// Steering position in [-1, 1]; 1 is full right lock.
    pub fn set_steering(&mut self, value: f64) {
        self.steering_input = value.clamp(-1.0, 1.0);
        // Positive steering input turns right, which is a negative rotation
        // about the up axis.
        self.steering_angle = -self.steering_input * self.max_steering_angle;
    }

    pub fn set_auto_clutch(&mut self, value: bool) {
        self.auto_clutch = value;
    }

    pub fn set_auto_shift(&mut self, value: bool) {
        self.auto_shift = value;
    }

    pub fn set_abs(&mut self, value: bool) {
        self.abs_enabled = value;
    }

    pub fn set_tcs(&mut self, value: bool) {
        self.tcs_enabled = value;
    }

    pub fn set_nitrous(&mut self, factor: f64) {
        self.engine.set_nitrous(factor);
    }

    pub fn start_engine(&mut self) {
        self.engine.start();
    }

    // --- Runtime query surface ---

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn transmission(&self) -> &Transmission {
        &self.transmission
    }

    pub fn clutch(&self) -> &Clutch {
        &self.clutch
    }

    pub fn fuel_tank(&self) -> &FuelTank {
        &self.fuel_tank
    }

    pub fn wheel(&self, wp: WheelPosition) -> &Wheel {
        &self.wheels[wp.index()]
    }

    pub fn tire(&self, wp: WheelPosition) -> &Tire {
        &self.tires[wp.index()]
    }

    pub fn brake(&self, wp: WheelPosition) -> &Brake {
        &self.brakes[wp.index()]
    }

    pub fn suspension(&self, wp: WheelPosition) -> &Suspension {
        &self.suspensions[wp.index()]
    }

    pub fn gear(&self) -> i32 {
        self.transmission.gear()
    }

    pub fn rpm(&self) -> f64 {
        self.engine.rpm()
    }

    /// Smoothed RPM for the tachometer needle.
    pub fn tacho_rpm(&self) -> f64 {
        self.tacho_rpm
    }

    pub fn speed(&self) -> f64 {
        self.body.linear_velocity.norm()
    }

    pub fn inv_mass(&self) -> f64 {
        self.body.inv_mass
    }

    /// Body angular velocity, world frame.
    pub fn angular_velocity(&self) -> Vec3 {
        self.body.angular_velocity
    }

    /// Last commanded steering position in [-1, 1].
    pub fn steering(&self) -> f64 {
        self.steering_input
    }

    /// Signed forward speed in m/s.
    pub fn forward_speed(&self) -> f64 {
        let forward = self.body.transform.rotation * Vec3::x();
        self.body.linear_velocity.dot(&forward)
    }

    pub fn lateral_velocity(&self) -> f64 {
        let left = self.body.transform.rotation * Vec3::y();
        self.body.linear_velocity.dot(&left)
    }

    pub fn max_steering_angle_deg(&self) -> f64 {
        self.max_steering_angle.to_degrees()
    }

    pub fn wheel_contact(&self, wp: WheelPosition) -> Option<&ContactSample> {
        self.wheel_contacts[wp.index()].as_ref()
    }

    pub fn wheel_world_position(&self, wp: WheelPosition) -> WorldPoint {
        self.wheel_position[wp.index()]
    }

    pub fn wheel_world_orientation(&self, wp: WheelPosition) -> Quat {
        self.wheel_orientation[wp.index()]
    }

    pub fn wheel_world_velocity(&self, wp: WheelPosition) -> Vec3 {
        self.wheel_velocity[wp.index()]
    }

    pub fn abs_enabled(&self) -> bool {
        self.abs_enabled
    }

    pub fn tcs_enabled(&self) -> bool {
        self.tcs_enabled
    }

    pub fn abs_active(&self, wp: WheelPosition) -> bool {
        self.abs_active[wp.index()]
    }

    pub fn tcs_active(&self, wp: WheelPosition) -> bool {
        self.tcs_active[wp.index()]
    }

    pub fn any_abs_active(&self) -> bool {
        self.abs_active.iter().any(|&a| a)
    }

    pub fn any_tcs_active(&self) -> bool {
        self.tcs_active.iter().any(|&a| a)
    }

    /// Total aerodynamic force from the last tick, world frame.
    pub fn total_aero_force(&self) -> Vec3 {
        self.total_aero_force
    }

    pub fn downforce_coefficient(&self) -> f64 {
        -self
            .aerodynamics
            .iter()
            .map(|d| d.lift_coefficient_total())
            .sum::<f64>()
    }

    pub fn drag_coefficient(&self) -> f64 {
        self.aerodynamics
            .iter()
            .map(|d| d.drag_coefficient_total())
            .sum()
    }

    /// Steering-wheel force feedback proxy, from the front tires' aligning
    /// torque.
    pub fn feedback(&self) -> f64 {
        self.feedback
    }

    pub fn mass_properties(&self) -> &MassProperties {
        &self.mass_properties
    }

    /// Cloneable handle for the render side; reads never block the tick.
    pub fn snapshots(&self) -> Arc<StateSnapshots> {
        Arc::clone(&self.snapshots)
    }

    pub fn interpolated(&self) -> InterpolatedState {
        self.snapshots.latest()
    }

    // --- Persistence ---

    pub fn save_state(&self) -> SavedState {
        self.engine.save_state()
    }

    pub fn restore_state(&mut self, state: &SavedState) {
        self.engine.restore_state(state);
    }

    // --- Recovery operations (best effort, no success signal) ---

    /// Translates the body along its down axis until the closest wheel
    /// rests on the ground, and zeroes the velocities.
    pub fn align_with_ground(&mut self, world: &dyn CollisionWorld, body: &mut dyn RigidBody) {
        self.sync_body(body);
        let transform = self.body.transform;
        let down = transform.rotation * (-Vec3::z());

        const PROBE: f64 = 10.0;
        let mut closest = f64::MAX;
        for i in 0..4 {
            let top = self.suspensions[i].attachment() + Vec3::z() * self.suspensions[i].travel();
            let origin = transform * WorldPoint::from(top);
            let rest = self.suspensions[i].travel() + self.wheels[i].radius();
            if let Some(hit) = world.ray_cast(origin, down, rest + PROBE) {
                let distance = rest + PROBE - hit.depth;
                closest = closest.min(distance - rest);
            }
        }
        if closest == f64::MAX {
            return;
        }

        let mut aligned = transform;
        // A hair of compression so the wheels start the next tick in contact.
        aligned.translation.vector += down * (closest + 0.005);
        body.set_transform(aligned);
        body.set_velocity(Vec3::zeros(), Vec3::zeros());
        self.body.transform = aligned;
        self.body.prev_transform = aligned;
        self.update_wheel_transforms(0.0);
    }

    /// Rotates the car back onto its wheels after a rollover, preserving
    /// position and heading.
    pub fn rollover_recover(&mut self, body: &mut dyn RigidBody) {
        self.sync_body(body);
        let transform = self.body.transform;

        let forward = transform.rotation * Vec3::x();
        let flat = Vec3::new(forward.x, forward.y, 0.0);
        let yaw = if flat.norm() > 1e-6 {
            flat.y.atan2(flat.x)
        } else {
            0.0
        };

        let mut upright = transform;
        upright.rotation = Quat::from_axis_angle(&Vec3::z_axis(), yaw);
        body.set_transform(upright);
        body.set_velocity(Vec3::zeros(), Vec3::zeros());
        self.body.transform = upright;
        self.body.prev_transform = upright;
        self.update_wheel_transforms(0.0);
    }

    // --- Debug ---

    /// Human-readable multi-section state dump.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "---Engine---");
        let _ = writeln!(out, "RPM: {:.0}", self.engine.rpm());
        let _ = writeln!(out, "Throttle position: {:.2}", self.engine.throttle());
        let _ = writeln!(
            out,
            "Combustion torque: {:.1}",
            self.engine.combustion_torque()
        );
        let _ = writeln!(out, "Clutch torque: {:.1}", -self.engine.clutch_torque());
        let _ = writeln!(out, "Total torque: {:.1}", self.engine.torque());
        let _ = writeln!(out, "Fuel: {:.1}%", self.fuel_tank.fill_fraction() * 100.0);
        let _ = writeln!(out, "Out of fuel: {}", self.engine.is_out_of_fuel());
        let _ = writeln!(out, "Rev limit exceeded: {}", self.engine.is_rev_limited());
        let _ = writeln!(out, "Running: {}", !self.engine.is_stalled());

        let _ = writeln!(out, "---Clutch---");
        let _ = writeln!(out, "Engagement: {:.2}", self.clutch.engagement());
        let _ = writeln!(out, "Locked: {}", self.clutch.is_locked());

        let _ = writeln!(out, "---Transmission---");
        let _ = writeln!(out, "Gear: {}", self.transmission.gear());
        let _ = writeln!(out, "Driveshaft RPM: {:.0}", self.driveshaft_rpm);
        let _ = writeln!(out, "Shift time remaining: {:.3}", self.remaining_shift_time);

        let _ = writeln!(out, "---Wheels---");
        for wp in WheelPosition::ALL {
            let i = wp.index();
            let _ = writeln!(
                out,
                "{:?}: w {:.1} rad/s, slip {:.3}, load {:.0} N, susp {:.3} m, abs {} tcs {}",
                wp,
                self.wheels[i].ang_velocity(),
                self.tires[i].slip_ratio(),
                self.suspensions[i].normal_force(),
                self.suspensions[i].displacement(),
                self.abs_active[i],
                self.tcs_active[i],
            );
        }

        let _ = writeln!(out, "---Body---");
        let p = self.body.transform.translation.vector;
        let _ = writeln!(out, "Position: {:.2} {:.2} {:.2}", p.x, p.y, p.z);
        let _ = writeln!(out, "Speed: {:.2} m/s", self.speed());
        let _ = writeln!(
            out,
            "Aero force: {:.0} {:.0} {:.0}",
            self.total_aero_force.x, self.total_aero_force.y, self.total_aero_force.z
        );
        let _ = writeln!(out, "Feedback: {:.3}", self.feedback);
        out
    }

    // --- Internal helpers shared by tick/control ---

    pub(crate) fn wheel_driven(&self, index: usize) -> bool {
        match self.drive {
            Drive::None => false,
            Drive::Front => index < 2,
            Drive::Rear => index >= 2,
            Drive::All => true,
        }
    }

    fn sync_body(&mut self, body: &dyn RigidBody) {
        self.body.transform = body.transform();
        self.body.linear_velocity = body.linear_velocity();
        self.body.angular_velocity = body.angular_velocity();
        self.body.inv_mass = body.inv_mass();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mass_aggregation_matches_analytic_centroid_and_inertia() {
        // chassis 1000 kg at the origin, engine 200 kg at (1, 0, 0.3)
        let particles = vec![
            (1000.0, Vec3::zeros()),
            (200.0, Vec3::new(1.0, 0.0, 0.3)),
        ];
        let props = VehicleDynamics::calculate_mass(&particles);

        assert_relative_eq!(props.mass, 1200.0);
        assert_relative_eq!(props.center_of_mass.x, 200.0 / 1200.0, epsilon = 1e-12);
        assert_relative_eq!(props.center_of_mass.y, 0.0);
        assert_relative_eq!(props.center_of_mass.z, 60.0 / 1200.0, epsilon = 1e-12);

        // Analytic point-mass inertia about the centroid:
        // Ixx = sum m (ry^2 + rz^2), etc., Ixz = -sum m rx rz.
        assert_relative_eq!(props.inertia[(0, 0)], 15.0, epsilon = 1e-9);
        assert_relative_eq!(props.inertia[(1, 1)], 181.0 + 2.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(props.inertia[(2, 2)], 166.0 + 2.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(props.inertia[(0, 2)], -50.0, epsilon = 1e-9);
        assert_relative_eq!(props.inertia[(2, 0)], -50.0, epsilon = 1e-9);
        assert_relative_eq!(props.inertia[(0, 1)], 0.0, epsilon = 1e-12);
    }
}
