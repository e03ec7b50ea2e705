// apex_core/src/abstractions.rs

use nalgebra::Isometry3;

use crate::types::{Mat3, SurfaceId, Vec3, WorldPoint};

// --- EXTERNAL ENGINE CONTRACTS ---
// The collision/rigid-body engine is referenced, never owned. The core only
// reads query results from it and requests state changes through these
// traits; the host (or a mock in tests) provides the implementations.

/// One wheel-contact query result. Valid for the tick it was produced in;
/// stale samples must not be reused without a fresh query.
#[derive(Debug, Clone)]
pub struct ContactSample {
    /// Contact point in world space.
    pub point: WorldPoint,
    /// Surface normal at the contact, unit length, pointing away from the ground.
    pub normal: Vec3,
    /// Identifier of the surface that was hit.
    pub surface: SurfaceId,
    /// How far the cast penetrated past the hit, i.e. `ray_length - hit_distance`.
    pub depth: f64,
}

/// Read-only collision queries consumed by the core.
pub trait CollisionWorld {
    /// Casts a ray of `length` meters from `origin` along the unit vector
    /// `direction`, returning the closest hit or `None` for no contact.
    fn ray_cast(&self, origin: WorldPoint, direction: Vec3, length: f64) -> Option<ContactSample>;
}

/// The external rigid body driven by the vehicle. The external engine is the
/// sole arbiter of transform writes; the core requests changes (force/torque
/// application, or direct overrides for recovery operations) rather than
/// mutating the transform itself.
pub trait RigidBody {
    fn transform(&self) -> Isometry3<f64>;

    fn linear_velocity(&self) -> Vec3;

    fn angular_velocity(&self) -> Vec3;

    fn inv_mass(&self) -> f64;

    /// Installs the aggregated mass, center of mass (body frame) and inertia
    /// tensor computed from the vehicle's mass particles.
    fn set_mass_properties(&mut self, mass: f64, center_of_mass: Vec3, inertia: Mat3);

    /// Advances the body by one integration step under the given world-space
    /// force and torque. Called exactly once per tick.
    fn integrate(&mut self, force: Vec3, torque: Vec3, dt: f64);

    /// Direct transform override, used by the recovery operations
    /// (align-with-ground, rollover recovery).
    fn set_transform(&mut self, transform: Isometry3<f64>);

    /// Direct velocity override, used by the recovery operations.
    fn set_velocity(&mut self, linear: Vec3, angular: Vec3);

    /// Velocity of the body-fixed point currently at `world_point`.
    fn velocity_at(&self, world_point: WorldPoint) -> Vec3 {
        let r = world_point - WorldPoint::from(self.transform().translation.vector);
        self.linear_velocity() + self.angular_velocity().cross(&r)
    }
}
