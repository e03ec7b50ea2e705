// apex_sim/src/world.rs

//! The harness side of the core's external contracts: an infinite flat
//! ground plane for contact queries and a free rigid body integrated with
//! symplectic Euler.

use nalgebra::{Isometry3, Translation3, UnitQuaternion};

use apex_core::abstractions::{CollisionWorld, ContactSample, RigidBody};
use apex_core::types::{Mat3, SurfaceId, Vec3, WorldPoint};

/// Infinite plane at `height`, normal +Z.
#[derive(Debug, Clone)]
pub struct FlatGround {
    height: f64,
    surface: SurfaceId,
}

impl FlatGround {
    pub fn new(height: f64) -> Self {
        Self {
            height,
            surface: SurfaceId(0),
        }
    }
}

impl CollisionWorld for FlatGround {
    fn ray_cast(&self, origin: WorldPoint, direction: Vec3, length: f64) -> Option<ContactSample> {
        if direction.z.abs() < 1e-9 {
            return None;
        }
        let t = (self.height - origin.z) / direction.z;
        if !(0.0..=length).contains(&t) {
            return None;
        }
        Some(ContactSample {
            point: origin + direction * t,
            normal: Vec3::z(),
            surface: self.surface,
            depth: length - t,
        })
    }
}

/// The rigid body the vehicle drives. Owns transform and velocity; the core
/// requests changes through the `RigidBody` trait.
#[derive(Debug, Clone)]
pub struct SimBody {
    transform: Isometry3<f64>,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    mass: f64,
    inv_inertia: Mat3,
    gravity: Vec3,
}

impl SimBody {
    pub fn new(position: Vec3, gravity: Vec3) -> Self {
        Self {
            transform: Isometry3::from_parts(
                Translation3::from(position),
                UnitQuaternion::identity(),
            ),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            mass: 1.0,
            inv_inertia: Mat3::identity(),
            gravity,
        }
    }
}

impl RigidBody for SimBody {
    fn transform(&self) -> Isometry3<f64> {
        self.transform
    }

    fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn inv_mass(&self) -> f64 {
        1.0 / self.mass
    }

    fn set_mass_properties(&mut self, mass: f64, _center_of_mass: Vec3, inertia: Mat3) {
        self.mass = mass;
        self.inv_inertia = inertia.try_inverse().unwrap_or_else(Mat3::identity);
    }

    fn integrate(&mut self, force: Vec3, torque: Vec3, dt: f64) {
        self.linear_velocity += (force / self.mass + self.gravity) * dt;

        let rot = self.transform.rotation.to_rotation_matrix();
        let inv_inertia_world = rot.matrix() * self.inv_inertia * rot.matrix().transpose();
        self.angular_velocity += inv_inertia_world * torque * dt;

        self.transform.translation.vector += self.linear_velocity * dt;
        self.transform.rotation =
            UnitQuaternion::from_scaled_axis(self.angular_velocity * dt) * self.transform.rotation;
    }

    fn set_transform(&mut self, transform: Isometry3<f64>) {
        self.transform = transform;
    }

    fn set_velocity(&mut self, linear: Vec3, angular: Vec3) {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ray_cast_reports_penetration_depth() {
        let ground = FlatGround::new(0.0);
        let hit = ground
            .ray_cast(WorldPoint::new(0.0, 0.0, 1.0), -Vec3::z(), 1.5)
            .expect("ray must hit the plane");
        assert_relative_eq!(hit.depth, 0.5);
        assert_relative_eq!(hit.point.z, 0.0);
        assert_relative_eq!(hit.normal.z, 1.0);
    }

    #[test]
    fn ray_cast_misses_past_its_length() {
        let ground = FlatGround::new(0.0);
        assert!(ground
            .ray_cast(WorldPoint::new(0.0, 0.0, 2.0), -Vec3::z(), 1.5)
            .is_none());
    }

    #[test]
    fn free_fall_integrates_gravity() {
        let mut body = SimBody::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -9.81));
        body.set_mass_properties(100.0, Vec3::zeros(), Mat3::identity() * 50.0);
        for _ in 0..100 {
            body.integrate(Vec3::zeros(), Vec3::zeros(), 0.01);
        }
        // One second of free fall.
        assert_relative_eq!(body.linear_velocity().z, -9.81, epsilon = 1e-9);
        assert!(body.transform().translation.vector.z < 10.0 - 4.5);
    }

    #[test]
    fn torque_spins_the_body() {
        let mut body = SimBody::new(Vec3::zeros(), Vec3::zeros());
        body.set_mass_properties(10.0, Vec3::zeros(), Mat3::identity() * 2.0);
        body.integrate(Vec3::zeros(), Vec3::new(0.0, 0.0, 4.0), 0.5);
        assert_relative_eq!(body.angular_velocity().z, 1.0, epsilon = 1e-9);
    }
}
