// apex_core/src/test_support.rs

//! Shared fixtures for the unit tests.

use crate::config::*;
use crate::types::Drive;

/// A plausible mid-size rear-wheel-drive coupe. Unit tests lean on this so
/// they exercise the same parameter ranges the sim assets use.
pub fn sample_config() -> VehicleConfig {
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
            nos_mass: 2.0,
            nos_boost: 4.0e4,
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
        aerodynamics: vec![
            AeroDeviceConfig {
                position: [0.0, 0.0, 0.1],
                air_density: 1.2,
                drag_frontal_area: 2.0,
                drag_coefficient: 0.32,
                lift_surface_area: 0.0,
                lift_coefficient: 0.0,
                lift_efficiency: 1.0,
            },
            AeroDeviceConfig {
                position: [-1.9, 0.0, 0.6],
                air_density: 1.2,
                drag_frontal_area: 0.0,
                drag_coefficient: 0.0,
                lift_surface_area: 1.0,
                lift_coefficient: -1.3,
                lift_efficiency: 0.95,
            },
        ],
    }
}
