// apex_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::abstractions::{CollisionWorld, ContactSample, RigidBody};
pub use crate::error::VehicleError;

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::config::VehicleConfig;
pub use crate::snapshot::{InterpolatedState, StateSnapshots, WheelPose};
pub use crate::types::{Drive, SurfaceId, WheelPosition};

// --- The Orchestrator ---
pub use crate::vehicle::{MassProperties, SavedState, VehicleDynamics};
