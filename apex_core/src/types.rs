// apex_core/src/types.rs

use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

// --- Core Type Aliases ---
pub type Vec3 = Vector3<f64>;
pub type Quat = UnitQuaternion<f64>;
pub type Mat3 = Matrix3<f64>;
pub type WorldPoint = Point3<f64>;

// Body frame convention: +X forward, +Y left, +Z up.
// Wheel angular velocity is positive when the wheel rolls the car forward.

/// One of the four wheel corners. Array-backed state is indexed by this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelPosition {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl WheelPosition {
    pub const ALL: [WheelPosition; 4] = [
        WheelPosition::FrontLeft,
        WheelPosition::FrontRight,
        WheelPosition::RearLeft,
        WheelPosition::RearRight,
    ];

    pub fn index(self) -> usize {
        match self {
            WheelPosition::FrontLeft => 0,
            WheelPosition::FrontRight => 1,
            WheelPosition::RearLeft => 2,
            WheelPosition::RearRight => 3,
        }
    }

    pub fn is_front(self) -> bool {
        matches!(self, WheelPosition::FrontLeft | WheelPosition::FrontRight)
    }

    pub fn is_left(self) -> bool {
        matches!(self, WheelPosition::FrontLeft | WheelPosition::RearLeft)
    }
}

/// Which axle(s) receive drive torque. Fixed at load time; selects which
/// differential instances exist and how torque flows between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Drive {
    None,
    Front,
    Rear,
    All,
}

/// Opaque identifier of the surface a wheel contact was reported on.
/// The core carries it through for telemetry; the host owns the meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

// --- Unit Conversions ---

pub fn rpm_to_rad_per_sec(rpm: f64) -> f64 {
    rpm * std::f64::consts::PI / 30.0
}

pub fn rad_per_sec_to_rpm(rad_per_sec: f64) -> f64 {
    rad_per_sec * 30.0 / std::f64::consts::PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rpm_conversion_round_trips() {
        assert_relative_eq!(rad_per_sec_to_rpm(rpm_to_rad_per_sec(7800.0)), 7800.0);
        assert_relative_eq!(rpm_to_rad_per_sec(60.0), 2.0 * std::f64::consts::PI);
    }

    #[test]
    fn wheel_position_indices_are_stable() {
        for (i, wp) in WheelPosition::ALL.iter().enumerate() {
            assert_eq!(wp.index(), i);
        }
        assert!(WheelPosition::FrontLeft.is_front());
        assert!(!WheelPosition::RearRight.is_front());
        assert!(WheelPosition::RearLeft.is_left());
    }
}
