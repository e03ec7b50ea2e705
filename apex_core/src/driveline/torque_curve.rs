// apex_core/src/driveline/torque_curve.rs

use crate::error::VehicleError;
use crate::utils::interp::LinearInterp;

/// Full-throttle engine torque as a function of RPM.
///
/// Built once from configuration and immutable afterwards. The configured
/// samples are padded with a (0, 0) point and a zero-torque point well past
/// the last sample, so the curve falls off smoothly at both ends instead of
/// clamping to the outermost configured torque.
#[derive(Debug, Clone)]
pub struct TorqueCurve {
    curve: LinearInterp<f64>,
}

impl TorqueCurve {
    /// Over-rev padding distance past the last configured sample, in RPM.
    const OVERREV_PAD: f64 = 10_000.0;

    pub fn from_points(points: &[[f64; 2]]) -> Result<Self, VehicleError> {
        if points.len() < 2 {
            return Err(VehicleError::TorqueCurve(points.len()));
        }

        let mut curve = LinearInterp::new();
        for &[rpm, torque] in points {
            if rpm < 0.0 {
                return Err(VehicleError::invalid(
                    "engine.torque_curve",
                    format!("negative rpm sample {rpm}"),
                ));
            }
            curve.add_point(rpm, torque);
        }

        // Smooth fall-off to zero at both ends.
        if curve.first().map(|(rpm, _)| rpm) != Some(0.0) {
            curve.add_point(0.0, 0.0);
        }
        let (last_rpm, _) = curve.last().unwrap_or((0.0, 0.0));
        curve.add_point(last_rpm + Self::OVERREV_PAD, 0.0);

        Ok(Self { curve })
    }

    /// Full-throttle torque at `rpm`.
    pub fn torque(&self, rpm: f64) -> f64 {
        self.curve.interpolate(rpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn curve() -> TorqueCurve {
        TorqueCurve::from_points(&[[1000.0, 200.0], [4000.0, 300.0], [7000.0, 250.0]]).unwrap()
    }

    #[test]
    fn rejects_fewer_than_two_points() {
        assert!(TorqueCurve::from_points(&[[1000.0, 200.0]]).is_err());
        assert!(TorqueCurve::from_points(&[]).is_err());
    }

    #[test]
    fn pads_endpoints_to_zero() {
        let c = curve();
        assert_relative_eq!(c.torque(0.0), 0.0);
        assert_relative_eq!(c.torque(17_000.0), 0.0);
        // Half way down the over-rev pad the torque has decayed but not vanished.
        let falling = c.torque(12_000.0);
        assert!(falling > 0.0 && falling < 250.0);
    }

    #[test]
    fn interpolates_configured_region() {
        let c = curve();
        assert_relative_eq!(c.torque(2500.0), 250.0);
        assert_relative_eq!(c.torque(4000.0), 300.0);
    }
}
