// apex_core/src/config.rs

//! The construction-time parameter schema. The host is responsible for
//! parsing whatever file format it uses into these structs (the sim crate
//! uses TOML); the core only defines the schema and validates it.
//!
//! Loading fails closed: `VehicleConfig::validate` rejects any description
//! that could not produce a complete vehicle, and nothing is constructed
//! from a rejected config.

use serde::{Deserialize, Serialize};

use crate::error::VehicleError;
use crate::types::Drive;

// =========================================================================
// == Top-Level Vehicle Description ==
// =========================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)] // Fail if the file has fields not in our schema
pub struct VehicleConfig {
    pub body: BodyConfig,

    /// Which axle(s) are driven. Determines which differentials must exist.
    pub drive: Drive,

    /// Maximum steering lock in degrees; `set_steering(1.0)` maps to this.
    #[serde(default = "default_max_steering_angle")]
    pub max_steering_angle: f64,

    pub engine: EngineConfig,

    #[serde(default)]
    pub fuel_tank: FuelTankConfig,

    pub clutch: ClutchConfig,

    pub transmission: TransmissionConfig,

    #[serde(default)]
    pub differential_front: Option<DifferentialConfig>,

    #[serde(default)]
    pub differential_rear: Option<DifferentialConfig>,

    #[serde(default)]
    pub differential_center: Option<DifferentialConfig>,

    pub front: AxleConfig,

    pub rear: AxleConfig,

    #[serde(default)]
    pub aerodynamics: Vec<AeroDeviceConfig>,
}

fn default_max_steering_angle() -> f64 {
    30.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    /// Chassis mass in kg, excluding engine, fuel and wheels (those are
    /// separate mass particles).
    pub mass: f64,

    /// Position of the chassis mass particle in the body frame.
    #[serde(default)]
    pub position: [f64; 3],
}

// =========================================================================
// == Driveline ==
// =========================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Swept volume in m^3. Also drives the friction model coefficients.
    pub displacement: f64,

    /// Peak power in W. Retained for telemetry and validation.
    pub max_power: f64,

    /// RPM of peak power; the auto-shift upshift point.
    pub redline: f64,

    /// Hard rev limiter RPM.
    pub rpm_limit: f64,

    /// Rev limiter hysteresis in RPM. Empirical tuning value.
    #[serde(default = "default_rev_limit_hysteresis")]
    pub rev_limit_hysteresis: f64,

    /// Idle throttle fraction. Derived from the torque curve when omitted.
    #[serde(default)]
    pub idle: Option<f64>,

    /// RPM the starter spins the engine up to.
    pub start_rpm: f64,

    /// RPM below which the engine stalls.
    pub stall_rpm: f64,

    /// Rotational inertia of the crankshaft in kg m^2.
    pub inertia: f64,

    /// Engine block mass in kg (mass particle).
    pub mass: f64,

    /// Engine block position in the body frame (mass particle).
    pub position: [f64; 3],

    /// Full-throttle torque curve as (rpm, torque) pairs, at least two.
    pub torque_curve: Vec<[f64; 2]>,

    /// Ws/kg of fuel.
    #[serde(default = "default_fuel_heating_value")]
    pub fuel_heating_value: f64,

    /// Thermal efficiency fraction.
    #[serde(default = "default_engine_efficiency")]
    pub efficiency: f64,

    /// Nitrous charge in kg. Zero disables the system.
    #[serde(default)]
    pub nos_mass: f64,

    /// Boost power in W at full injection.
    #[serde(default)]
    pub nos_boost: f64,

    /// kg of nitrous consumed per kg of fuel while boosting.
    #[serde(default = "default_nos_fuel_ratio")]
    pub nos_fuel_ratio: f64,
}

fn default_rev_limit_hysteresis() -> f64 {
    100.0
}

fn default_fuel_heating_value() -> f64 {
    4.5e7
}

fn default_engine_efficiency() -> f64 {
    0.35
}

fn default_nos_fuel_ratio() -> f64 {
    5.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FuelTankConfig {
    /// Tank capacity in liters.
    pub capacity: f64,
    /// Initial fill in liters.
    pub volume: f64,
    /// Fuel density in kg/l.
    pub density: f64,
    /// Tank position in the body frame (mass particle).
    pub position: [f64; 3],
}

impl Default for FuelTankConfig {
    fn default() -> Self {
        Self {
            capacity: 60.0,
            volume: 40.0,
            density: 0.8,
            position: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClutchConfig {
    pub sliding_friction: f64,
    pub max_pressure: f64,
    pub area: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransmissionConfig {
    /// Forward gear ratios, first gear first. Must be non-empty.
    pub gear_ratios: Vec<f64>,

    /// Reverse gear ratio, as a positive magnitude.
    pub reverse_ratio: f64,

    /// Time a full shift takes in seconds. Empirical tuning value.
    #[serde(default = "default_shift_time")]
    pub shift_time: f64,
}

fn default_shift_time() -> f64 {
    0.2
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DifferentialConfig {
    pub final_drive: f64,

    /// Viscous anti-slip coefficient (N m s). Zero gives an open diff.
    #[serde(default)]
    pub anti_slip: f64,

    /// Torque-sensing anti-slip factor; > 0 makes the locking torque follow
    /// the input torque instead of the fixed `anti_slip` cap.
    #[serde(default)]
    pub anti_slip_torque: f64,

    /// Fraction of the torque-sensing effect retained on deceleration.
    #[serde(default)]
    pub anti_slip_torque_deceleration_factor: f64,

    /// Share of torque sent to the second output, 0.5 = symmetric.
    #[serde(default = "default_torque_split")]
    pub torque_split: f64,
}

fn default_torque_split() -> f64 {
    0.5
}

// =========================================================================
// == Per-Axle Corner Hardware ==
// =========================================================================

/// Parameters for one axle; left and right corners share them, with the
/// suspension attachment mirrored across the centerline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AxleConfig {
    pub wheel: WheelConfig,
    pub tire: TireConfig,
    pub brake: BrakeConfig,
    pub suspension: SuspensionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WheelConfig {
    /// Rolling radius in m.
    pub radius: f64,
    /// Rotational inertia in kg m^2.
    pub inertia: f64,
    /// Wheel mass in kg (mass particle).
    pub mass: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TireConfig {
    /// Longitudinal friction coefficient at the nominal load.
    pub friction_long: f64,
    /// Lateral friction coefficient at the nominal load.
    pub friction_lat: f64,
    /// How quickly friction falls off as load exceeds nominal; 0 = no falloff.
    #[serde(default)]
    pub load_sensitivity: f64,
    /// Load in N at which the friction coefficients apply.
    pub nominal_load: f64,
    /// Longitudinal stiffness in N per unit slip ratio.
    pub longitudinal_stiffness: f64,
    /// Cornering stiffness in N/rad.
    pub cornering_stiffness: f64,
    /// Rolling resistance: constant and speed-squared coefficients.
    #[serde(default)]
    pub rolling_resistance: [f64; 2],
    /// Pneumatic trail in m, for the aligning-torque feedback proxy.
    #[serde(default = "default_pneumatic_trail")]
    pub pneumatic_trail: f64,
}

fn default_pneumatic_trail() -> f64 {
    0.03
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BrakeConfig {
    pub friction: f64,
    pub max_pressure: f64,
    pub area: f64,
    pub radius: f64,
    /// Share of total braking handled by this axle, in [0, 1].
    pub bias: f64,
    /// Handbrake gain; 0 means the handbrake does not act on this axle.
    #[serde(default)]
    pub handbrake: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SuspensionConfig {
    /// Spring rate in N/m.
    pub spring_constant: f64,
    /// Compression damping in N s/m.
    pub bounce: f64,
    /// Extension damping in N s/m.
    pub rebound: f64,
    /// Usable travel in m.
    pub travel: f64,
    /// Left-side wheel center at full droop, in the body frame. The right
    /// side mirrors the y component.
    pub position: [f64; 3],
}

// =========================================================================
// == Aerodynamics ==
// =========================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AeroDeviceConfig {
    /// Application point of the device's force, in the body frame.
    pub position: [f64; 3],
    #[serde(default = "default_air_density")]
    pub air_density: f64,
    pub drag_frontal_area: f64,
    pub drag_coefficient: f64,
    /// Lifting surface; zero for a pure drag body.
    #[serde(default)]
    pub lift_surface_area: f64,
    /// Negative values produce downforce.
    #[serde(default)]
    pub lift_coefficient: f64,
    #[serde(default = "default_lift_efficiency")]
    pub lift_efficiency: f64,
}

fn default_air_density() -> f64 {
    1.2
}

fn default_lift_efficiency() -> f64 {
    1.0
}

// =========================================================================
// == Validation ==
// =========================================================================

impl VehicleConfig {
    /// Rejects any description that cannot produce a complete vehicle.
    pub fn validate(&self) -> Result<(), VehicleError> {
        if self.body.mass <= 0.0 {
            return Err(VehicleError::invalid("body.mass", "must be positive"));
        }
        if self.engine.displacement <= 0.0 {
            return Err(VehicleError::invalid(
                "engine.displacement",
                "must be positive",
            ));
        }
        if self.engine.max_power <= 0.0 {
            return Err(VehicleError::invalid("engine.max_power", "must be positive"));
        }
        if self.engine.inertia <= 0.0 {
            return Err(VehicleError::invalid("engine.inertia", "must be positive"));
        }
        if self.engine.mass <= 0.0 {
            return Err(VehicleError::invalid("engine.mass", "must be positive"));
        }
        if self.engine.rpm_limit < self.engine.redline {
            return Err(VehicleError::invalid(
                "engine.rpm_limit",
                "must not be below the redline",
            ));
        }
        if self.engine.stall_rpm >= self.engine.start_rpm {
            return Err(VehicleError::invalid(
                "engine.stall_rpm",
                "must be below the start rpm",
            ));
        }
        if self.engine.torque_curve.len() < 2 {
            return Err(VehicleError::TorqueCurve(self.engine.torque_curve.len()));
        }
        if self.transmission.gear_ratios.is_empty() {
            return Err(VehicleError::EmptyGearTable);
        }

        for (axle, cfg) in [("front", &self.front), ("rear", &self.rear)] {
            if cfg.wheel.radius <= 0.0 || cfg.wheel.inertia <= 0.0 || cfg.wheel.mass <= 0.0 {
                return Err(VehicleError::invalid(
                    "wheel",
                    format!("{axle} wheel radius, inertia and mass must be positive"),
                ));
            }
            if cfg.tire.nominal_load <= 0.0 {
                return Err(VehicleError::invalid(
                    "tire.nominal_load",
                    format!("{axle} tire nominal load must be positive"),
                ));
            }
            if cfg.suspension.travel <= 0.0 {
                return Err(VehicleError::invalid(
                    "suspension.travel",
                    format!("{axle} suspension travel must be positive"),
                ));
            }
        }

        let need = |diff: &Option<DifferentialConfig>, name: &'static str, drive: &'static str| {
            if diff.is_none() {
                Err(VehicleError::MissingDifferential {
                    drive,
                    differential: name,
                })
            } else {
                Ok(())
            }
        };
        match self.drive {
            Drive::None => {}
            Drive::Front => need(&self.differential_front, "front", "Front")?,
            Drive::Rear => need(&self.differential_rear, "rear", "Rear")?,
            Drive::All => {
                need(&self.differential_front, "front", "All")?;
                need(&self.differential_rear, "rear", "All")?;
                need(&self.differential_center, "center", "All")?;
            }
        }
        Ok(())
    }
}
