// apex_core/src/snapshot.rs

//! Interpolated state for rendering.
//!
//! The fixed-step tick publishes a pose snapshot at its own cadence; the
//! rendering path reads at an arbitrary, possibly sub-tick cadence. The
//! contract is single-writer / multiple-reader with no partially updated
//! snapshot ever observable, implemented as a double buffer: the writer
//! fills the back slot and flips an atomic front index.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::types::{Quat, Vec3, WorldPoint};

#[derive(Debug, Clone, Copy)]
pub struct WheelPose {
    pub position: WorldPoint,
    pub orientation: Quat,
}

impl Default for WheelPose {
    fn default() -> Self {
        Self {
            position: WorldPoint::origin(),
            orientation: Quat::identity(),
        }
    }
}

/// A complete pose snapshot for presentation.
#[derive(Debug, Clone)]
pub struct InterpolatedState {
    pub position: Vec3,
    pub orientation: Quat,
    pub wheels: [WheelPose; 4],
}

impl Default for InterpolatedState {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
            wheels: [WheelPose::default(); 4],
        }
    }
}

/// Double-buffered snapshot cell.
#[derive(Debug, Default)]
pub struct StateSnapshots {
    slots: [RwLock<InterpolatedState>; 2],
    front: AtomicUsize,
}

impl StateSnapshots {
    pub fn new(initial: InterpolatedState) -> Self {
        Self {
            slots: [RwLock::new(initial.clone()), RwLock::new(initial)],
            front: AtomicUsize::new(0),
        }
    }

    /// Publishes a new snapshot. Called by the simulation tick only.
    pub fn publish(&self, state: InterpolatedState) {
        let back = 1 - self.front.load(Ordering::Acquire);
        if let Ok(mut slot) = self.slots[back].write() {
            *slot = state;
            self.front.store(back, Ordering::Release);
        }
    }

    /// Returns the most recently published snapshot. Readers never observe
    /// a slot the writer is currently filling.
    pub fn latest(&self) -> InterpolatedState {
        let front = self.front.load(Ordering::Acquire);
        self.slots[front]
            .read()
            .map(|s| (*s).clone())
            .unwrap_or_default()
    }
}
