#![warn(missing_docs)]
//! Core primitives shared across the workspace.
//!
//! Everything here is pure: lattice snapping, face resolution against a target
//! transform, instance poses and the validated placement settings that the
//! modal session reads every tick.

pub mod face;
pub mod grid;
pub mod pose;
pub mod settings;

// Re-export commonly used types
pub use face::Face;
pub use grid::{snap, GridConfig};
pub use pose::{Pose, TransformConfig};
pub use settings::{ConfigError, MeshRef, PlacementMode, PlacementSettings};
