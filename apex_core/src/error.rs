// apex_core/src/error.rs

use thiserror::Error;

/// Construction-time failures. Loading fails closed: no partial vehicle is
/// ever built. At runtime the simulation raises nothing; degenerate states
/// are represented as flags on the components instead.
#[derive(Debug, Error)]
pub enum VehicleError {
    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("invalid value for `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("the torque curve must define at least 2 points, got {0}")]
    TorqueCurve(usize),

    #[error("the transmission must define at least one forward gear")]
    EmptyGearTable,

    #[error("drive configuration `{drive}` requires a `{differential}` differential")]
    MissingDifferential {
        drive: &'static str,
        differential: &'static str,
    },
}

impl VehicleError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        VehicleError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
