// apex_core/src/vehicle/tick.rs

//! The fixed-step tick and the per-wheel force pipeline.
//!
//! Order within a tick is load-bearing: suspension/contact must resolve
//! before tire forces (normal-force dependency) and the driveline before
//! tire forces (drive-torque dependency).

use nalgebra::{Isometry3, Translation3};

use super::VehicleDynamics;
use crate::abstractions::{CollisionWorld, RigidBody};
use crate::snapshot::{InterpolatedState, WheelPose};
use crate::types::{Quat, Vec3, WheelPosition, WorldPoint};

/// Low-speed threshold under which slip calculations switch to their
/// degenerate forms instead of dividing by a vanishing ground speed.
const SLIP_SPEED_EPSILON: f64 = 0.01;

impl VehicleDynamics {
    /// Advances the simulation by `elapsed` host seconds, running as many
    /// fixed `dt` steps as have accrued (possibly zero), then publishes an
    /// interpolated snapshot for the renderer.
    pub fn advance(
        &mut self,
        world: &dyn CollisionWorld,
        body: &mut dyn RigidBody,
        elapsed: f64,
        dt: f64,
    ) {
        if dt <= 0.0 {
            return;
        }
        self.accumulator += elapsed.max(0.0);
        while self.accumulator >= dt {
            self.tick(world, body, dt);
            self.accumulator -= dt;
        }
        self.publish_snapshot(self.accumulator / dt);
    }

    /// One fixed step. Either completes fully or (on a panic in the host
    /// callbacks) leaves no externally visible partial state: outputs are
    /// only applied at the single `integrate` call.
    pub fn tick(&mut self, world: &dyn CollisionWorld, body: &mut dyn RigidBody, dt: f64) {
        self.sync_body(body);

        self.update_wheel_contacts(world);
        let normal_forces = self.update_suspension(dt);

        let mut drive_torque = [0.0; 4];
        self.update_driveline(&mut drive_torque, &normal_forces, dt);

        let (mut force, mut torque) = self.update_wheels(body, &normal_forces, &drive_torque, dt);
        self.add_aerodynamics(&mut force, &mut torque);

        // Crankshaft reaction rolls the chassis.
        torque += self.body.transform.rotation * Vec3::new(-self.engine.torque(), 0.0, 0.0);

        body.integrate(force, torque, dt);
        self.refresh_body(body);

        self.update_wheel_transforms(dt);
        for i in 0..4 {
            self.wheel_velocity[i] = body.velocity_at(self.wheel_position[i]);
        }

        self.tacho_rpm = self.engine.rpm() * 0.3 + self.tacho_rpm * 0.7;
    }

    /// Queries the collision engine once per wheel along the suspension
    /// travel axis. Samples are valid for this tick only.
    fn update_wheel_contacts(&mut self, world: &dyn CollisionWorld) {
        let transform = self.body.transform;
        let down = transform.rotation * (-Vec3::z());
        for i in 0..4 {
            let top = self.suspensions[i].attachment() + Vec3::z() * self.suspensions[i].travel();
            let origin = transform * WorldPoint::from(top);
            let length = self.suspensions[i].travel() + self.wheels[i].radius();
            self.wheel_contacts[i] = world.ray_cast(origin, down, length);
        }
    }

    /// Converts contact penetration into strut compression and produces the
    /// per-wheel normal forces for this tick.
    fn update_suspension(&mut self, dt: f64) -> [f64; 4] {
        let mut normal_forces = [0.0; 4];
        for i in 0..4 {
            let compression = self.wheel_contacts[i]
                .as_ref()
                .map(|c| c.depth)
                .unwrap_or(0.0);
            normal_forces[i] = self.suspensions[i].update(compression, dt);
        }
        normal_forces
    }

    /// Per-wheel tire/brake stage. Integrates wheel angular velocities and
    /// returns the summed world force and torque (about the center of mass)
    /// the wheels exert on the body.
    fn update_wheels(
        &mut self,
        body: &dyn RigidBody,
        normal_forces: &[f64; 4],
        drive_torque: &[f64; 4],
        dt: f64,
    ) -> (Vec3, Vec3) {
        let mut force = Vec3::zeros();
        let mut torque = Vec3::zeros();
        let com_world = self.body.transform * WorldPoint::from(self.mass_properties.center_of_mass);
        let mut front_feedback = 0.0;

        for i in 0..4 {
            // Pedals first; ABS may override the factor for this tick.
            self.brakes[i].set_brake_factor(self.brake_input);
            self.brakes[i].set_handbrake_factor(self.handbrake_input);
            if self.abs_enabled {
                self.do_abs(i, normal_forces[i]);
            } else {
                self.abs_active[i] = false;
            }

            let steer = if WheelPosition::ALL[i].is_front() {
                self.steering_angle
            } else {
                0.0
            };
            let wheel_rot =
                self.body.transform.rotation * Quat::from_axis_angle(&Vec3::z_axis(), steer);

            let contact = self.wheel_contacts[i].clone();
            if let Some(contact) = contact {
                let normal = contact.normal;

                // Wheel heading projected onto the contact plane.
                let heading = wheel_rot * Vec3::x();
                let mut forward = heading - normal * heading.dot(&normal);
                if forward.norm() > 1e-6 {
                    forward.normalize_mut();
                } else {
                    forward = heading;
                }
                let side = normal.cross(&forward);

                let ground_velocity = body.velocity_at(contact.point);
                let v_long = ground_velocity.dot(&forward);
                let v_lat = ground_velocity.dot(&side);

                let surface_speed = self.wheels[i].surface_speed();
                let slip_ratio = if v_long.abs() < SLIP_SPEED_EPSILON {
                    // Spinning in place is pure slip; parked is none.
                    if surface_speed.abs() > 0.1 {
                        surface_speed.signum()
                    } else {
                        0.0
                    }
                } else {
                    (surface_speed - v_long) / v_long.abs()
                };
                // Floor the denominator so a standing car does not see a
                // huge slip angle from millimeter-per-second drift.
                let slip_angle = v_lat.atan2(v_long.abs().max(0.5));

                let load = normal_forces[i];
                let (fx, fy) = self.tires[i].update(load, slip_ratio, slip_angle);

                // Drive torque and tire reaction on the wheel shaft.
                let radius = self.wheels[i].radius();
                self.wheels[i].integrate(drive_torque[i] - fx * radius, dt);
                self.apply_brake_torque(i, dt);

                let rolling = self.tires[i].rolling_resistance(v_long, load);
                let rolling_force = if v_long.abs() > 0.1 {
                    -v_long.signum() * rolling
                } else {
                    0.0
                };

                let world_force = normal * load + forward * (fx + rolling_force) + side * fy;
                force += world_force;
                let lever = contact.point - com_world;
                torque += lever.cross(&world_force);

                if WheelPosition::ALL[i].is_front() {
                    front_feedback += 0.5 * self.tires[i].aligning_torque();
                }
            } else {
                // Airborne: no contact-patch coupling, the shaft still spins.
                self.tires[i].update(0.0, 0.0, 0.0);
                self.wheels[i].integrate(drive_torque[i], dt);
                self.apply_brake_torque(i, dt);
            }
        }

        self.feedback = self.feedback * 0.5 + front_feedback * 0.5;
        (force, torque)
    }

    /// Applies the brake's opposing torque to a wheel, bounded so it cannot
    /// reverse the wheel within the step, and records lock-up.
    fn apply_brake_torque(&mut self, i: usize, dt: f64) {
        let braking = self.brakes[i].torque();
        if braking > 0.0 {
            let locked = self.wheels[i].apply_opposing_torque(braking, dt);
            self.brakes[i].set_will_lock(locked);
        } else {
            self.brakes[i].set_will_lock(false);
        }
    }

    /// Aerodynamic force/torque from the current body velocity.
    fn add_aerodynamics(&mut self, force: &mut Vec3, torque: &mut Vec3) {
        let rotation = self.body.transform.rotation;
        let wind_body = rotation.inverse() * (-self.body.linear_velocity);

        let mut aero_force = Vec3::zeros();
        let mut aero_torque = Vec3::zeros();
        for device in &self.aerodynamics {
            let f = device.force(&wind_body);
            aero_force += f;
            aero_torque += (device.position() - self.mass_properties.center_of_mass).cross(&f);
        }

        self.total_aero_force = rotation * aero_force;
        *force += self.total_aero_force;
        *torque += rotation * aero_torque;
    }

    fn refresh_body(&mut self, body: &dyn RigidBody) {
        self.body.prev_transform = self.body.transform;
        self.body.transform = body.transform();
        self.body.linear_velocity = body.linear_velocity();
        self.body.angular_velocity = body.angular_velocity();
        self.body.inv_mass = body.inv_mass();
    }

    /// Recomputes wheel world poses from the body transform, suspension
    /// displacement and steering angle.
    pub(crate) fn update_wheel_transforms(&mut self, dt: f64) {
        const TWO_PI: f64 = 2.0 * std::f64::consts::PI;
        for i in 0..4 {
            self.wheel_spin_angle[i] =
                (self.wheel_spin_angle[i] + self.wheels[i].ang_velocity() * dt) % TWO_PI;
            self.wheel_position[i] = self.body.transform * WorldPoint::from(self.wheel_local(i));
            self.wheel_orientation[i] = self.body.transform.rotation * self.wheel_local_rotation(i);
        }
    }

    fn wheel_local(&self, i: usize) -> Vec3 {
        self.suspensions[i].attachment() + Vec3::z() * self.suspensions[i].displacement()
    }

    fn wheel_local_rotation(&self, i: usize) -> Quat {
        let steer = if WheelPosition::ALL[i].is_front() {
            self.steering_angle
        } else {
            0.0
        };
        // Rolling forward spins the wheel about the negative left axis.
        Quat::from_axis_angle(&Vec3::z_axis(), steer)
            * Quat::from_axis_angle(&Vec3::y_axis(), -self.wheel_spin_angle[i])
    }

    /// Publishes the render snapshot, interpolated between the last two
    /// body transforms by `alpha` in [0, 1].
    pub(crate) fn publish_snapshot(&self, alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        let prev = &self.body.prev_transform;
        let current = &self.body.transform;

        let position = prev
            .translation
            .vector
            .lerp(&current.translation.vector, alpha);
        let orientation = prev.rotation.slerp(&current.rotation, alpha);
        let pose = Isometry3::from_parts(Translation3::from(position), orientation);

        let mut wheels = [WheelPose::default(); 4];
        for i in 0..4 {
            wheels[i] = WheelPose {
                position: pose * WorldPoint::from(self.wheel_local(i)),
                orientation: orientation * self.wheel_local_rotation(i),
            };
        }

        self.snapshots.publish(InterpolatedState {
            position,
            orientation,
            wheels,
        });
    }
}
