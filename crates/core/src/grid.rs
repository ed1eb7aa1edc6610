//! Lattice snapping.
//!
//! A grid is described by a per-axis spacing and an offset; lattice points are
//! `offset + k * spacing` for integer `k` on every axis independently.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::settings::ConfigError;

/// Smallest spacing accepted on any axis after clamping.
pub const MIN_GRID_SPACING: f32 = 0.001;

/// Snap `position` to the nearest lattice point.
///
/// Ties at exactly half a cell round to the even lattice index (so `0.5`
/// snaps to `0.0` and `1.5` to `2.0` with unit spacing).
///
/// Every `spacing` component must be non-zero; [`GridConfig`] guarantees this
/// for callers that go through it.
pub fn snap(position: Vec3, spacing: Vec3, offset: Vec3) -> Vec3 {
    debug_assert!(
        spacing.cmpne(Vec3::ZERO).all(),
        "grid spacing must be non-zero"
    );
    let cells = ((position - offset) / spacing).to_array().map(f32::round_ties_even);
    Vec3::from_array(cells) * spacing + offset
}

/// Validated grid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    spacing: Vec3,
    offset: Vec3,
}

impl GridConfig {
    /// Unit grid anchored at the origin.
    pub const UNIT: Self = Self {
        spacing: Vec3::ONE,
        offset: Vec3::ZERO,
    };

    /// Build a grid, refusing non-positive or non-finite spacing.
    pub fn new(spacing: Vec3, offset: Vec3) -> Result<Self, ConfigError> {
        if !spacing.is_finite() || spacing.cmple(Vec3::ZERO).any() {
            return Err(ConfigError::InvalidSpacing(spacing));
        }
        if !offset.is_finite() {
            return Err(ConfigError::InvalidOffset(offset));
        }
        Ok(Self { spacing, offset })
    }

    /// Build a grid, raising every spacing component to at least
    /// [`MIN_GRID_SPACING`].
    pub fn clamped(spacing: Vec3, offset: Vec3) -> Self {
        let spacing = Vec3::from_array(spacing.to_array().map(|s| {
            if s.is_finite() {
                s.max(MIN_GRID_SPACING)
            } else {
                1.0
            }
        }));
        let offset = if offset.is_finite() {
            offset
        } else {
            Vec3::ZERO
        };
        Self { spacing, offset }
    }

    /// Per-axis spacing (strictly positive).
    pub fn spacing(&self) -> Vec3 {
        self.spacing
    }

    /// Lattice offset.
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Snap `position` onto this grid.
    pub fn snap(&self, position: Vec3) -> Vec3 {
        snap(position, self.spacing, self.offset)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::UNIT
    }
}
