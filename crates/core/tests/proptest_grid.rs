//! Property-based tests for lattice snapping
//!
//! Validates snapping invariants:
//! - Snapping is idempotent
//! - Snapped points lie on the lattice `offset + k * spacing`
//! - A snapped point is never more than half a cell away from the input
//!
//! These properties must hold for every positive spacing.

use glam::Vec3;
use gridbuild_core::{snap, GridConfig};
use proptest::prelude::*;

fn vec3(range: std::ops::Range<f32>) -> impl Strategy<Value = Vec3> {
    (range.clone(), range.clone(), range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    /// Property: snapping an already snapped point is a no-op.
    #[test]
    fn snap_is_idempotent(
        position in vec3(-1000.0..1000.0),
        spacing in vec3(0.1..10.0),
        offset in vec3(-10.0..10.0),
    ) {
        let once = snap(position, spacing, offset);
        let twice = snap(once, spacing, offset);
        prop_assert_eq!(once, twice);
    }

    /// Property: the result is an integer number of cells away from the offset.
    #[test]
    fn snap_lands_on_lattice(
        position in vec3(-1000.0..1000.0),
        spacing in vec3(0.1..10.0),
        offset in vec3(-10.0..10.0),
    ) {
        let snapped = snap(position, spacing, offset);
        let cells = (snapped - offset) / spacing;
        for (axis, k) in cells.to_array().into_iter().enumerate() {
            prop_assert!(
                (k - k.round()).abs() < 1e-2,
                "axis {} is {} cells from the offset",
                axis, k
            );
        }
    }

    /// Property: the snapped point is the nearest lattice point.
    #[test]
    fn snap_stays_within_half_a_cell(
        position in vec3(-1000.0..1000.0),
        spacing in vec3(0.1..10.0),
        offset in vec3(-10.0..10.0),
    ) {
        let grid = GridConfig::new(spacing, offset).expect("positive spacing");
        let delta = (grid.snap(position) - position).abs();
        let limit = spacing * 0.5 + Vec3::splat(1e-3);
        prop_assert!(delta.cmple(limit).all(), "delta {} exceeds {}", delta, limit);
    }
}
