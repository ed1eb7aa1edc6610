//! Which face of a target block a ray hit.

use glam::{Affine3A, Vec3};

/// One of the six axis-aligned faces of a block, in the block's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// +X
    PosX,
    /// -X
    NegX,
    /// +Y
    PosY,
    /// -Y
    NegY,
    /// +Z
    PosZ,
    /// -Z
    NegZ,
}

impl Face {
    /// All faces in axis priority order.
    pub const ALL: [Face; 6] = [
        Face::PosX,
        Face::NegX,
        Face::PosY,
        Face::NegY,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Resolve the face of `target` closest to `world_hit`.
    ///
    /// The hit point is moved into the target's local frame through the inverse
    /// of its world transform before comparing axis magnitudes.
    pub fn resolve(target: &Affine3A, world_hit: Vec3) -> Self {
        Self::from_local(target.inverse().transform_point3(world_hit))
    }

    /// Pick the dominant axis of a local-space point.
    ///
    /// X wins only when strictly larger than both Y and Z, then Y under the same
    /// rule; everything else (including an exact tie between X and Y) lands on
    /// Z. A zero Z component maps to [`Face::PosZ`].
    pub fn from_local(local: Vec3) -> Self {
        let mag = local.abs();
        if mag.x > mag.y && mag.x > mag.z {
            if local.x >= 0.0 {
                Face::PosX
            } else {
                Face::NegX
            }
        } else if mag.y > mag.x && mag.y > mag.z {
            if local.y >= 0.0 {
                Face::PosY
            } else {
                Face::NegY
            }
        } else if local.z >= 0.0 {
            Face::PosZ
        } else {
            Face::NegZ
        }
    }

    /// Outward unit vector of this face.
    pub fn unit(self) -> Vec3 {
        match self {
            Face::PosX => Vec3::X,
            Face::NegX => Vec3::NEG_X,
            Face::PosY => Vec3::Y,
            Face::NegY => Vec3::NEG_Y,
            Face::PosZ => Vec3::Z,
            Face::NegZ => Vec3::NEG_Z,
        }
    }

    /// The face on the opposite side of the block.
    pub fn opposite(self) -> Self {
        match self {
            Face::PosX => Face::NegX,
            Face::NegX => Face::PosX,
            Face::PosY => Face::NegY,
            Face::NegY => Face::PosY,
            Face::PosZ => Face::NegZ,
            Face::NegZ => Face::PosZ,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn unit_cube_at_origin() {
        let cube = Affine3A::IDENTITY;
        assert_eq!(Face::resolve(&cube, Vec3::new(0.6, 0.1, 0.1)), Face::PosX);
        assert_eq!(Face::resolve(&cube, Vec3::new(0.0, 0.0, -0.9)), Face::NegZ);
        assert_eq!(Face::resolve(&cube, Vec3::new(-0.6, 0.1, 0.1)), Face::NegX);
        assert_eq!(Face::resolve(&cube, Vec3::new(0.0, 0.0, 0.9)), Face::PosZ);
        assert_eq!(Face::resolve(&cube, Vec3::new(0.1, 0.5, -0.2)), Face::PosY);
        assert_eq!(Face::resolve(&cube, Vec3::new(0.1, -0.5, -0.2)), Face::NegY);
    }

    #[test]
    fn symmetric_points_map_to_opposite_faces() {
        let cube = Affine3A::from_translation(Vec3::new(3.0, -2.0, 1.0));
        for local in [
            Vec3::new(0.45, 0.1, -0.2),
            Vec3::new(0.05, 0.49, 0.3),
            Vec3::new(-0.1, 0.2, 0.5),
        ] {
            let hit = Vec3::new(3.0, -2.0, 1.0) + local;
            let mirrored = Vec3::new(3.0, -2.0, 1.0) - local;
            assert_eq!(
                Face::resolve(&cube, hit).opposite(),
                Face::resolve(&cube, mirrored)
            );
        }
    }

    #[test]
    fn rotation_is_resolved_in_local_frame() {
        // Quarter turn about Z maps local +X onto world +Y.
        let cube = Affine3A::from_rotation_translation(
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::ZERO,
        );
        assert_eq!(Face::resolve(&cube, Vec3::new(0.0, 0.5, 0.1)), Face::PosX);
    }

    #[test]
    fn exact_tie_falls_through_to_z() {
        assert_eq!(Face::from_local(Vec3::new(0.5, 0.5, 0.1)), Face::PosZ);
        assert_eq!(Face::from_local(Vec3::new(0.5, 0.5, -0.1)), Face::NegZ);
        assert_eq!(Face::from_local(Vec3::new(0.5, 0.1, 0.5)), Face::PosZ);
    }
}
