//! Placement settings read by the modal session every tick.
//!
//! The settings panel owns these values; the session only reads them. Invalid
//! values are either refused ([`PlacementSettings::validate`]) or clamped to a
//! safe minimum ([`PlacementSettings::sanitized`]) before they reach the grid
//! or the rate gate.

use std::fmt;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::grid::{GridConfig, MIN_GRID_SPACING};
use crate::pose::TransformConfig;

/// Slowest accepted placement rate, in operations per second.
pub const MIN_PLACEMENT_SPEED: f32 = 0.1;
/// Closest accepted build distance for [`PlacementMode::View`].
pub const MIN_VIEW_BUILD_DISTANCE: f32 = 0.1;
/// Shortest accepted polling tick.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Errors emitted when settings fail validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Grid spacing must be strictly positive and finite on every axis.
    #[error("grid spacing must be positive on every axis, got {0}")]
    InvalidSpacing(Vec3),
    /// Grid offset must be finite.
    #[error("grid offset must be finite, got {0}")]
    InvalidOffset(Vec3),
    /// Placement speed must be strictly positive.
    #[error("placement speed must be positive, got {0}")]
    InvalidSpeed(f32),
    /// View build distance below the minimum.
    #[error("view build distance must be at least {min}, got {0}", min = MIN_VIEW_BUILD_DISTANCE)]
    InvalidViewDistance(f32),
    /// Polling tick below the minimum.
    #[error("tick interval must be at least {min} ms, got {0} ms", min = MIN_TICK_INTERVAL_MS)]
    InvalidTickInterval(u64),
}

/// How the candidate position is derived from the pointer ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlacementMode {
    /// Snap against the face of the block under the pointer.
    #[default]
    #[serde(rename = "3d")]
    ThreeD,
    /// Intersect a ground plane through the 3D cursor.
    #[serde(rename = "2d")]
    TwoD,
    /// Build at a fixed distance along the view ray.
    #[serde(rename = "view")]
    View,
}

impl PlacementMode {
    /// Parse a mode label (`3d`, `2d`, `view`).
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "3d" | "three_d" => Some(Self::ThreeD),
            "2d" | "two_d" => Some(Self::TwoD),
            "view" => Some(Self::View),
            _ => None,
        }
    }
}

impl fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreeD => write!(f, "3d"),
            Self::TwoD => write!(f, "2d"),
            Self::View => write!(f, "view"),
        }
    }
}

/// Name of a host mesh that placed blocks clone instead of the unit cube.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshRef(pub String);

impl MeshRef {
    /// Create a mesh reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Mesh name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MeshRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every option the placement session recognizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// Active placement strategy.
    pub placement_mode: PlacementMode,
    /// Per-axis grid spacing.
    pub grid_spacing: Vec3,
    /// Grid origin.
    pub grid_offset: Vec3,
    /// Scale of placed blocks.
    pub block_scale: Vec3,
    /// XYZ Euler rotation of placed blocks, in degrees.
    pub block_rotation_degrees: Vec3,
    /// Clone [`Self::custom_mesh`] instead of creating a unit cube.
    pub use_custom_mesh: bool,
    /// Mesh cloned when `use_custom_mesh` is set.
    pub custom_mesh: Option<MeshRef>,
    /// Show the wireframe preview at the candidate position.
    pub show_preview: bool,
    /// Continuous placement/deletion rate, in operations per second.
    pub placement_speed: f32,
    /// Distance along the view ray used by [`PlacementMode::View`].
    pub view_build_distance: f32,
    /// Period of the polling tick that keeps the session alive.
    pub tick_interval_ms: u64,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            placement_mode: PlacementMode::ThreeD,
            grid_spacing: Vec3::ONE,
            grid_offset: Vec3::ZERO,
            block_scale: Vec3::ONE,
            block_rotation_degrees: Vec3::ZERO,
            use_custom_mesh: false,
            custom_mesh: None,
            show_preview: true,
            placement_speed: 10.0,
            view_build_distance: 10.0,
            tick_interval_ms: 100,
        }
    }
}

impl PlacementSettings {
    /// Refuse settings the grid or the rate gate cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        GridConfig::new(self.grid_spacing, self.grid_offset)?;
        if !(self.placement_speed.is_finite() && self.placement_speed > 0.0) {
            return Err(ConfigError::InvalidSpeed(self.placement_speed));
        }
        if !(self.view_build_distance.is_finite()
            && self.view_build_distance >= MIN_VIEW_BUILD_DISTANCE)
        {
            return Err(ConfigError::InvalidViewDistance(self.view_build_distance));
        }
        if self.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(ConfigError::InvalidTickInterval(self.tick_interval_ms));
        }
        Ok(())
    }

    /// Copy of these settings with every out-of-range value clamped.
    ///
    /// Each clamp is logged once per call.
    pub fn sanitized(&self) -> Self {
        let mut out = self.clone();

        let grid = GridConfig::clamped(self.grid_spacing, self.grid_offset);
        if grid.spacing() != self.grid_spacing {
            warn!(
                spacing = %self.grid_spacing,
                clamped = %grid.spacing(),
                min = MIN_GRID_SPACING,
                "Grid spacing out of range; clamping"
            );
        }
        if grid.offset() != self.grid_offset {
            warn!(
                offset = %self.grid_offset,
                "Grid offset is not finite; using the origin"
            );
        }
        out.grid_spacing = grid.spacing();
        out.grid_offset = grid.offset();

        if !(self.placement_speed.is_finite() && self.placement_speed >= MIN_PLACEMENT_SPEED) {
            warn!(
                speed = self.placement_speed,
                min = MIN_PLACEMENT_SPEED,
                "Placement speed out of range; clamping"
            );
            out.placement_speed = if self.placement_speed.is_finite() {
                self.placement_speed.max(MIN_PLACEMENT_SPEED)
            } else {
                MIN_PLACEMENT_SPEED
            };
        }

        if !(self.view_build_distance.is_finite()
            && self.view_build_distance >= MIN_VIEW_BUILD_DISTANCE)
        {
            warn!(
                distance = self.view_build_distance,
                min = MIN_VIEW_BUILD_DISTANCE,
                "View build distance out of range; clamping"
            );
            out.view_build_distance = if self.view_build_distance.is_finite() {
                self.view_build_distance.max(MIN_VIEW_BUILD_DISTANCE)
            } else {
                MIN_VIEW_BUILD_DISTANCE
            };
        }

        if self.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            warn!(
                tick_ms = self.tick_interval_ms,
                min = MIN_TICK_INTERVAL_MS,
                "Tick interval too short; clamping"
            );
            out.tick_interval_ms = MIN_TICK_INTERVAL_MS;
        }

        out
    }

    /// Whether `other` holds exactly the same values, bit for bit.
    ///
    /// Unlike `==`, a NaN field compares equal to the same NaN.
    pub fn same_as(&self, other: &Self) -> bool {
        fn bits(v: Vec3) -> [u32; 3] {
            v.to_array().map(f32::to_bits)
        }
        self.placement_mode == other.placement_mode
            && bits(self.grid_spacing) == bits(other.grid_spacing)
            && bits(self.grid_offset) == bits(other.grid_offset)
            && bits(self.block_scale) == bits(other.block_scale)
            && bits(self.block_rotation_degrees) == bits(other.block_rotation_degrees)
            && self.use_custom_mesh == other.use_custom_mesh
            && self.custom_mesh == other.custom_mesh
            && self.show_preview == other.show_preview
            && self.placement_speed.to_bits() == other.placement_speed.to_bits()
            && self.view_build_distance.to_bits() == other.view_build_distance.to_bits()
            && self.tick_interval_ms == other.tick_interval_ms
    }

    /// Grid described by these settings, clamped to positive spacing.
    pub fn grid(&self) -> GridConfig {
        GridConfig::clamped(self.grid_spacing, self.grid_offset)
    }

    /// Transform applied to placed blocks and the preview.
    pub fn transform(&self) -> TransformConfig {
        TransformConfig {
            scale: self.block_scale,
            rotation_degrees: self.block_rotation_degrees,
        }
    }

    /// Minimum time between two commits.
    pub fn placement_interval(&self) -> Duration {
        let speed = if self.placement_speed.is_finite() {
            self.placement_speed.max(MIN_PLACEMENT_SPEED)
        } else {
            MIN_PLACEMENT_SPEED
        };
        Duration::from_secs_f64(1.0 / f64::from(speed))
    }

    /// Period of the polling tick.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS))
    }

    /// Mesh to clone for new blocks, or `None` for the unit cube.
    pub fn source_mesh(&self) -> Option<&MeshRef> {
        if self.use_custom_mesh {
            self.custom_mesh.as_ref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(PlacementSettings::default().validate(), Ok(()));
    }

    #[test]
    fn non_positive_speed_is_refused_and_clamped() {
        let settings = PlacementSettings {
            placement_speed: 0.0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::InvalidSpeed(0.0)));
        assert_eq!(settings.sanitized().placement_speed, MIN_PLACEMENT_SPEED);
        let interval = settings.placement_interval().as_secs_f32();
        assert!((interval - 10.0).abs() < 1e-3);
    }

    #[test]
    fn zero_spacing_is_refused_and_clamped() {
        let settings = PlacementSettings {
            grid_spacing: Vec3::new(1.0, 0.0, 1.0),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidSpacing(_))
        ));
        assert_eq!(
            settings.sanitized().grid_spacing,
            Vec3::new(1.0, MIN_GRID_SPACING, 1.0)
        );
    }

    #[test]
    fn non_finite_offset_is_reset_without_touching_spacing() {
        let settings = PlacementSettings {
            grid_spacing: Vec3::new(2.0, 2.0, 1.0),
            grid_offset: Vec3::new(f32::NAN, 0.0, 0.0),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidOffset(_))
        ));
        let sanitized = settings.sanitized();
        assert_eq!(sanitized.grid_spacing, Vec3::new(2.0, 2.0, 1.0));
        assert_eq!(sanitized.grid_offset, Vec3::ZERO);
    }

    #[test]
    fn same_as_treats_identical_nan_as_unchanged() {
        let settings = PlacementSettings {
            placement_speed: f32::NAN,
            block_scale: Vec3::new(1.0, f32::NAN, 1.0),
            ..Default::default()
        };
        assert_ne!(settings, settings.clone());
        assert!(settings.same_as(&settings.clone()));

        let mut moved = settings.clone();
        moved.placement_speed = 4.0;
        assert!(!settings.same_as(&moved));
    }

    #[test]
    fn custom_mesh_requires_flag() {
        let mut settings = PlacementSettings {
            custom_mesh: Some(MeshRef::new("Monkey")),
            ..Default::default()
        };
        assert_eq!(settings.source_mesh(), None);
        settings.use_custom_mesh = true;
        assert_eq!(settings.source_mesh(), Some(&MeshRef::new("Monkey")));
    }

    #[test]
    fn interval_is_inverse_of_speed() {
        let settings = PlacementSettings {
            placement_speed: 10.0,
            ..Default::default()
        };
        let interval = settings.placement_interval().as_secs_f32();
        assert!((interval - 0.1).abs() < 1e-6);
    }

    #[test]
    fn mode_labels_parse() {
        assert_eq!(PlacementMode::parse("3D"), Some(PlacementMode::ThreeD));
        assert_eq!(PlacementMode::parse("2d"), Some(PlacementMode::TwoD));
        assert_eq!(PlacementMode::parse("view"), Some(PlacementMode::View));
        assert_eq!(PlacementMode::parse("orbit"), None);
    }
}
