// apex_core/tests/common/mod.rs

//! Mock host: a flat-ground collision world and a free rigid body, plus a
//! shared car description for the scenario tests.

use apex_core::config::*;
use apex_core::prelude::{CollisionWorld, ContactSample, RigidBody, VehicleDynamics};
use apex_core::types::{Drive, Mat3, SurfaceId, Vec3, WorldPoint};
use nalgebra::{Isometry3, Translation3, UnitQuaternion};

pub struct FlatWorld {
    pub height: f64,
}

impl CollisionWorld for FlatWorld {
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
            surface: SurfaceId(0),
            depth: length - t,
        })
    }
}

/// Symplectic-Euler free body under gravity.
#[derive(Clone)]
pub struct TestBody {
    transform: Isometry3<f64>,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    mass: f64,
    inv_inertia: Mat3,
    gravity: Vec3,
}

impl TestBody {
    pub fn at_height(z: f64) -> Self {
        Self {
            transform: Isometry3::from_parts(
                Translation3::new(0.0, 0.0, z),
                UnitQuaternion::identity(),
            ),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            mass: 1.0,
            inv_inertia: Mat3::identity(),
            gravity: Vec3::new(0.0, 0.0, -9.81),
        }
    }
}

impl RigidBody for TestBody {
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

/// A mid-size rear-wheel-drive coupe on street tires.
pub fn test_config() -> VehicleConfig {
    let front = AxleConfig {
        wheel: WheelConfig {
            radius: 0.31,
            inertia: 1.1,
            mass: 18.0,
        },
        tire: TireConfig {
            friction_long: 1.1,
            friction_lat: 1.0,
            load_sensitivity: 0.1,
            nominal_load: 3800.0,
            longitudinal_stiffness: 110_000.0,
            cornering_stiffness: 75_000.0,
            rolling_resistance: [1.3e-2, 6.5e-6],
            pneumatic_trail: 0.03,
        },
        brake: BrakeConfig {
            friction: 0.73,
            max_pressure: 4.0e6,
            area: 0.015,
            radius: 0.14,
            bias: 0.55,
            handbrake: 0.0,
        },
        suspension: SuspensionConfig {
            spring_constant: 55_000.0,
            bounce: 3_200.0,
            rebound: 4_000.0,
            travel: 0.22,
            position: [1.25, 0.78, -0.15],
        },
    };
    let rear = AxleConfig {
        wheel: WheelConfig {
            radius: 0.31,
            inertia: 1.2,
            mass: 18.5,
        },
        tire: TireConfig {
            friction_long: 1.15,
            friction_lat: 1.05,
            load_sensitivity: 0.1,
            nominal_load: 4200.0,
            longitudinal_stiffness: 120_000.0,
            cornering_stiffness: 80_000.0,
            rolling_resistance: [1.3e-2, 6.5e-6],
            pneumatic_trail: 0.03,
        },
        brake: BrakeConfig {
            friction: 0.73,
            max_pressure: 4.0e6,
            area: 0.012,
            radius: 0.13,
            bias: 0.45,
            handbrake: 2.0,
        },
        suspension: SuspensionConfig {
            spring_constant: 60_000.0,
            bounce: 3_500.0,
            rebound: 4_400.0,
            travel: 0.22,
            position: [-1.35, 0.80, -0.15],
        },
    };

    VehicleConfig {
        body: BodyConfig {
            mass: 1150.0,
            position: [0.1, 0.0, -0.05],
        },
        drive: Drive::Rear,
        max_steering_angle: 32.0,
        engine: EngineConfig {
            displacement: 3.2e-3,
            max_power: 2.2e5,
            redline: 7200.0,
            rpm_limit: 7800.0,
            rev_limit_hysteresis: 100.0,
            idle: None,
            start_rpm: 1000.0,
            stall_rpm: 350.0,
            inertia: 0.33,
            mass: 180.0,
            position: [1.1, 0.0, -0.2],
            torque_curve: vec![
                [1000.0, 240.0],
                [2500.0, 310.0],
                [4400.0, 350.0],
                [6000.0, 330.0],
                [7200.0, 290.0],
            ],
            fuel_heating_value: 4.5e7,
            efficiency: 0.35,
            nos_mass: 0.0,
            nos_boost: 0.0,
            nos_fuel_ratio: 5.0,
        },
        fuel_tank: FuelTankConfig {
            capacity: 55.0,
            volume: 35.0,
            density: 0.8,
            position: [-1.0, 0.0, -0.26],
        },
        clutch: ClutchConfig {
            sliding_friction: 0.27,
            max_pressure: 1.1e4,
            area: 0.75,
            radius: 0.15,
        },
        transmission: TransmissionConfig {
            gear_ratios: vec![3.36, 2.09, 1.48, 1.13, 0.93, 0.78],
            reverse_ratio: 3.19,
            shift_time: 0.2,
        },
        differential_front: None,
        differential_rear: Some(DifferentialConfig {
            final_drive: 3.64,
            anti_slip: 600.0,
            anti_slip_torque: 0.0,
            anti_slip_torque_deceleration_factor: 0.0,
            torque_split: 0.5,
        }),
        differential_center: None,
        front,
        rear,
        aerodynamics: vec![AeroDeviceConfig {
            position: [0.0, 0.0, 0.1],
            air_density: 1.2,
            drag_frontal_area: 2.0,
            drag_coefficient: 0.32,
            lift_surface_area: 0.0,
            lift_coefficient: 0.0,
            lift_efficiency: 1.0,
        }],
    }
}

pub const DT: f64 = 1.0 / 240.0;

/// Spawns the car slightly above its rest compression and lets the
/// suspension settle.
pub fn settled_vehicle() -> (VehicleDynamics, FlatWorld, TestBody) {
    let world = FlatWorld { height: 0.0 };
    let mut body = TestBody::at_height(0.42);
    let mut vehicle =
        VehicleDynamics::new(&test_config(), &mut body).expect("test config must build");
    for _ in 0..240 {
        vehicle.tick(&world, &mut body, DT);
    }
    (vehicle, world, body)
}

/// Full-throttle launch with the automatics on, for `seconds`.
pub fn launch(vehicle: &mut VehicleDynamics, world: &FlatWorld, body: &mut TestBody, seconds: f64) {
    vehicle.set_auto_clutch(true);
    vehicle.set_auto_shift(true);
    vehicle.start_engine();
    vehicle.shift_gear(1);
    vehicle.set_throttle(1.0);
    let ticks = (seconds / DT) as usize;
    for _ in 0..ticks {
        vehicle.tick(world, body, DT);
    }
}
