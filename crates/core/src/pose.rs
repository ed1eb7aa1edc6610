//! Instance poses.

use glam::{Affine3A, EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Scale and rotation applied to every placed block and to the preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Per-axis scale.
    pub scale: Vec3,
    /// XYZ Euler rotation in degrees.
    pub rotation_degrees: Vec3,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotation_degrees: Vec3::ZERO,
        }
    }
}

impl TransformConfig {
    /// Rotation as a quaternion.
    pub fn rotation(&self) -> Quat {
        let r = self.rotation_degrees;
        Quat::from_euler(
            EulerRot::XYZ,
            r.x.to_radians(),
            r.y.to_radians(),
            r.z.to_radians(),
        )
    }

    /// Pose of a block at `translation` using this transform.
    pub fn pose_at(&self, translation: Vec3) -> Pose {
        Pose {
            translation,
            rotation: self.rotation(),
            scale: self.scale,
        }
    }
}

/// World pose of a scene instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// Identity pose at the origin.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Unrotated, unscaled pose at `translation`.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// World transform matrix.
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl From<Affine3A> for Pose {
    fn from(affine: Affine3A) -> Self {
        let (scale, rotation, translation) = affine.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_degrees_convert_to_radians() {
        let transform = TransformConfig {
            scale: Vec3::ONE,
            rotation_degrees: Vec3::new(0.0, 0.0, 90.0),
        };
        let rotated = transform.rotation() * Vec3::X;
        assert!(rotated.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn pose_round_trips_through_affine() {
        let pose = TransformConfig {
            scale: Vec3::new(2.0, 1.0, 0.5),
            rotation_degrees: Vec3::new(0.0, 45.0, 0.0),
        }
        .pose_at(Vec3::new(1.0, 2.0, 3.0));
        let back = Pose::from(pose.to_affine());
        assert!(back.translation.abs_diff_eq(pose.translation, 1e-5));
        assert!(back.scale.abs_diff_eq(pose.scale, 1e-5));
    }
}
