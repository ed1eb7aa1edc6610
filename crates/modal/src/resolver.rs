//! Candidate position resolution for the three placement modes.
//!
//! Resolution is stateless: the same ray, cursor and settings always produce
//! the same candidate. The session calls it once per event for the preview and
//! once more when a commit is due.

use glam::{Affine3A, Vec2, Vec3};
use gridbuild_core::settings::MIN_VIEW_BUILD_DISTANCE;
use gridbuild_core::{Face, PlacementMode, PlacementSettings};

use crate::host::{InstanceHandle, InstanceKind, Ray, RaycastHit, SceneQuery};

/// Rays closer to parallel than this never meet the ground plane.
pub const PLANE_PARALLEL_EPSILON: f32 = 1e-4;

/// Height used when committing in 3D mode with nothing under the pointer.
pub const EMPTY_SPACE_COMMIT_Z: f32 = 0.5;

/// Why a candidate is being resolved.
///
/// Only the 3D fallback differs: the preview follows the 3D cursor, while a
/// commit into empty space keeps the cursor's X/Y and drops onto
/// [`EMPTY_SPACE_COMMIT_Z`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Live preview feedback.
    Preview,
    /// An actual placement.
    Commit,
}

/// Per-event view state captured from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewContext {
    /// World ray under the pointer.
    pub ray: Ray,
    /// World transform of the 3D cursor.
    pub cursor: Affine3A,
}

impl ViewContext {
    /// Capture the ray under `pointer` and the current 3D cursor.
    pub fn capture<H: SceneQuery + ?Sized>(host: &H, pointer: Vec2) -> Option<Self> {
        let ray = host.view_ray(pointer)?;
        Some(Self {
            ray,
            cursor: host.cursor_transform(),
        })
    }

    /// 3D cursor location.
    pub fn cursor_location(&self) -> Vec3 {
        self.cursor.translation.into()
    }
}

/// The block hit by `ray`, if it is a valid anchor.
///
/// The ray passes through the preview. Misses and hits on non-mesh instances
/// count as nothing under the pointer.
pub fn placeable_hit<H: SceneQuery + ?Sized>(
    host: &H,
    ray: Ray,
    preview: Option<InstanceHandle>,
) -> Option<RaycastHit> {
    let hit = match preview {
        Some(preview) => host.raycast_excluding(ray, preview)?,
        None => host.raycast(ray)?,
    };
    if Some(hit.target) == preview {
        return None;
    }
    match host.instance_kind(hit.target) {
        Some(InstanceKind::Mesh) => Some(hit),
        _ => None,
    }
}

/// Resolve this event's snapped candidate position.
///
/// Returns `None` only in [`PlacementMode::TwoD`] when the ray runs parallel
/// to the ground plane.
pub fn resolve_candidate<H: SceneQuery + ?Sized>(
    host: &H,
    settings: &PlacementSettings,
    view: &ViewContext,
    purpose: Purpose,
    preview: Option<InstanceHandle>,
) -> Option<Vec3> {
    let base = match settings.placement_mode {
        PlacementMode::ThreeD => surface_base(host, view, purpose, preview),
        PlacementMode::View => view_base(view.ray, settings.view_build_distance),
        PlacementMode::TwoD => intersect_cursor_plane(view.ray, &view.cursor)?,
    };
    Some(settings.grid().snap(base))
}

/// Unsnapped 3D-mode base: the cell next to the hit face, or a fallback.
fn surface_base<H: SceneQuery + ?Sized>(
    host: &H,
    view: &ViewContext,
    purpose: Purpose,
    preview: Option<InstanceHandle>,
) -> Vec3 {
    let anchored = placeable_hit(host, view.ray, preview).and_then(|hit| {
        let target = host.instance_transform(hit.target)?;
        let face = Face::resolve(&target, hit.point);
        Some(Vec3::from(target.translation) + face.unit())
    });

    anchored.unwrap_or_else(|| {
        let cursor = view.cursor_location();
        match purpose {
            Purpose::Preview => cursor,
            Purpose::Commit => Vec3::new(cursor.x, cursor.y, EMPTY_SPACE_COMMIT_Z),
        }
    })
}

fn view_base(ray: Ray, distance: f32) -> Vec3 {
    ray.at(distance.max(MIN_VIEW_BUILD_DISTANCE))
}

/// Intersect `ray` with the plane through the 3D cursor, normal to its local Z.
///
/// The returned point keeps the cursor's Z so that small plane tilts never
/// lift blocks off the cursor's level. `None` when the ray is (nearly)
/// parallel to the plane. Intersections behind the ray origin are kept.
pub fn intersect_cursor_plane(ray: Ray, cursor: &Affine3A) -> Option<Vec3> {
    let plane_pos = Vec3::from(cursor.translation);
    let normal = cursor.transform_vector3(Vec3::Z).normalize_or_zero();
    if normal == Vec3::ZERO {
        return None;
    }

    let denom = ray.direction.dot(normal);
    if denom.abs() <= PLANE_PARALLEL_EPSILON {
        return None;
    }

    let t = (plane_pos - ray.origin).dot(normal) / denom;
    let mut hit = ray.at(t);
    hit.z = plane_pos.z;
    Some(hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use std::collections::HashMap;

    /// Minimal scene: canned raycast answers and a handful of instances.
    ///
    /// `hits` are ordered front to back; a ray reports the first one that lies
    /// ahead of its origin.
    #[derive(Default)]
    struct StubScene {
        hits: Vec<RaycastHit>,
        instances: HashMap<InstanceHandle, (Affine3A, InstanceKind)>,
        cursor: Affine3A,
    }

    impl SceneQuery for StubScene {
        fn viewport_available(&self) -> bool {
            true
        }
        fn view_ray(&self, pointer: Vec2) -> Option<Ray> {
            Some(Ray::new(pointer.extend(10.0), Vec3::NEG_Z))
        }
        fn cursor_transform(&self) -> Affine3A {
            self.cursor
        }
        fn raycast(&self, ray: Ray) -> Option<RaycastHit> {
            self.hits
                .iter()
                .find(|hit| (hit.point - ray.origin).dot(ray.direction) > 0.0)
                .copied()
        }
        fn instances(&self) -> Vec<InstanceHandle> {
            self.instances.keys().copied().collect()
        }
        fn is_alive(&self, handle: InstanceHandle) -> bool {
            self.instances.contains_key(&handle)
        }
        fn instance_transform(&self, handle: InstanceHandle) -> Option<Affine3A> {
            self.instances.get(&handle).map(|(t, _)| *t)
        }
        fn instance_kind(&self, handle: InstanceHandle) -> Option<InstanceKind> {
            self.instances.get(&handle).map(|(_, k)| *k)
        }
    }

    fn view(scene: &StubScene, pointer: Vec2) -> ViewContext {
        ViewContext::capture(scene, pointer).expect("stub always yields a ray")
    }

    #[test]
    fn three_d_places_next_to_hit_face() {
        let block = InstanceHandle(1);
        let mut scene = StubScene::default();
        scene.instances.insert(
            block,
            (
                Affine3A::from_translation(Vec3::new(2.0, 0.0, 0.0)),
                InstanceKind::Mesh,
            ),
        );
        scene.hits = vec![RaycastHit {
            point: Vec3::new(2.1, 0.0, 0.5),
            normal: Vec3::Z,
            target: block,
        }];

        let settings = PlacementSettings::default();
        let ctx = view(&scene, Vec2::new(2.0, 0.0));
        let candidate = resolve_candidate(&scene, &settings, &ctx, Purpose::Preview, None);
        assert_eq!(candidate, Some(Vec3::new(2.0, 0.0, 1.0)));
    }

    #[test]
    fn three_d_fallbacks_differ_between_preview_and_commit() {
        let mut scene = StubScene::default();
        scene.cursor = Affine3A::from_translation(Vec3::new(3.2, -1.1, 4.0));
        let settings = PlacementSettings::default();
        let ctx = view(&scene, Vec2::ZERO);

        let preview = resolve_candidate(&scene, &settings, &ctx, Purpose::Preview, None);
        let commit = resolve_candidate(&scene, &settings, &ctx, Purpose::Commit, None);
        assert_eq!(preview, Some(Vec3::new(3.0, -1.0, 4.0)));
        assert_eq!(commit, Some(Vec3::new(3.0, -1.0, 0.0)));
    }

    #[test]
    fn preview_and_non_mesh_hits_are_ignored() {
        let preview = InstanceHandle(7);
        let lamp = InstanceHandle(8);
        let mut scene = StubScene::default();
        scene
            .instances
            .insert(preview, (Affine3A::IDENTITY, InstanceKind::Mesh));
        scene
            .instances
            .insert(lamp, (Affine3A::IDENTITY, InstanceKind::Other));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);

        scene.hits = vec![RaycastHit {
            point: Vec3::new(0.0, 0.0, 0.5),
            normal: Vec3::Z,
            target: preview,
        }];
        assert!(placeable_hit(&scene, ray, Some(preview)).is_none());

        scene.hits = vec![RaycastHit {
            point: Vec3::new(0.0, 0.0, 0.5),
            normal: Vec3::Z,
            target: lamp,
        }];
        assert!(placeable_hit(&scene, ray, Some(preview)).is_none());
    }

    #[test]
    fn ray_passes_through_preview_to_block_behind() {
        let preview = InstanceHandle(7);
        let block = InstanceHandle(8);
        let mut scene = StubScene::default();
        scene.instances.insert(
            preview,
            (
                Affine3A::from_translation(Vec3::new(0.0, 0.0, 1.0)),
                InstanceKind::Mesh,
            ),
        );
        scene
            .instances
            .insert(block, (Affine3A::IDENTITY, InstanceKind::Mesh));
        scene.hits = vec![
            RaycastHit {
                point: Vec3::new(0.1, 0.1, 1.5),
                normal: Vec3::Z,
                target: preview,
            },
            RaycastHit {
                point: Vec3::new(0.1, 0.1, 0.5),
                normal: Vec3::Z,
                target: block,
            },
        ];
        let ray = Ray::new(Vec3::new(0.1, 0.1, 10.0), Vec3::NEG_Z);

        let hit = placeable_hit(&scene, ray, Some(preview)).expect("block behind preview");
        assert_eq!(hit.target, block);

        let settings = PlacementSettings::default();
        let ctx = view(&scene, Vec2::new(0.1, 0.1));
        for _ in 0..3 {
            let candidate =
                resolve_candidate(&scene, &settings, &ctx, Purpose::Preview, Some(preview));
            assert_eq!(candidate, Some(Vec3::new(0.0, 0.0, 1.0)));
        }
    }

    #[test]
    fn view_mode_builds_along_the_ray() {
        let scene = StubScene::default();
        let settings = PlacementSettings {
            placement_mode: PlacementMode::View,
            view_build_distance: 4.0,
            ..Default::default()
        };
        let ctx = view(&scene, Vec2::new(1.2, -0.4));
        let candidate = resolve_candidate(&scene, &settings, &ctx, Purpose::Commit, None);
        assert_eq!(candidate, Some(Vec3::new(1.0, 0.0, 6.0)));
    }

    #[test]
    fn parallel_ray_has_no_ground_intersection() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.00005));
        assert_eq!(intersect_cursor_plane(ray, &Affine3A::IDENTITY), None);

        let scene = StubScene::default();
        let settings = PlacementSettings {
            placement_mode: PlacementMode::TwoD,
            ..Default::default()
        };
        let ctx = ViewContext {
            ray,
            cursor: Affine3A::IDENTITY,
        };
        assert_eq!(
            resolve_candidate(&scene, &settings, &ctx, Purpose::Commit, None),
            None
        );
    }

    #[test]
    fn perpendicular_ray_keeps_cursor_height() {
        let cursor = Affine3A::from_translation(Vec3::new(0.0, 0.0, 3.0));
        let ray = Ray::new(Vec3::new(1.4, 2.6, 10.0), Vec3::NEG_Z);
        let hit = intersect_cursor_plane(ray, &cursor).expect("ray meets plane");
        assert_eq!(hit, Vec3::new(1.4, 2.6, 3.0));
    }

    #[test]
    fn tilted_plane_still_reports_cursor_height() {
        // Plane tilted about X; the raw intersection lies above the cursor.
        let cursor = Affine3A::from_rotation_translation(
            Quat::from_rotation_x(0.3),
            Vec3::new(0.0, 0.0, 2.0),
        );
        let ray = Ray::new(Vec3::new(0.0, 4.0, 10.0), Vec3::NEG_Z);
        let hit = intersect_cursor_plane(ray, &cursor).expect("ray meets plane");
        assert_eq!(hit.z, 2.0);
        assert!((hit.y - 4.0).abs() < 1e-5);
    }
}
