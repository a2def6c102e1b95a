//! Leaf shape types for the rigid-body hierarchy.
//!
//! Defines the two circle types the simulation is built from:
//! - `Circle` — a solid disk with local position, radius, and density
//! - `BoundingCircle` — a derived bounding volume used only for broad-phase pruning

use std::f64::consts::PI;

use crate::simulation::states::NVec2;

/// A solid disk belonging to a rigid body.
///
/// `position` is local to the owning body's frame. Mass is derived from the
/// area and density and never stored.
#[derive(Debug, Clone)]
pub struct Circle {
    pub position: NVec2, // center, local to the owning body
    pub radius: f64,
    pub density: f64,
}

impl Circle {
    pub fn new(position: NVec2, radius: f64, density: f64) -> Self {
        Self {
            position,
            radius,
            density,
        }
    }

    /// Mass of the disk: pi * r^2 * density
    pub fn mass(&self) -> f64 {
        PI * self.radius * self.radius * self.density
    }
}

/// Bounding volume over a body's subtree.
///
/// Purely derived: recomputed from the current subtree every tick by
/// `BodyStore::update_bounding_circle`, never mutated independently.
/// `position` is local to the body that owns it.
#[derive(Debug, Clone, Default)]
pub struct BoundingCircle {
    pub position: NVec2,
    pub radius: f64,
}
