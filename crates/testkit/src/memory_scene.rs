//! In-memory reference host.
//!
//! `MemoryScene` implements [`SceneHost`] over a plain map of instances. Every
//! instance is treated as a box spanning `[-0.5, 0.5]` on each local axis, the
//! view is a top-down orthographic camera, and raycasts report the nearest box
//! of any role, previews included.
//!
//! Tests use the knobs at the bottom of the impl to simulate a user deleting
//! objects mid-session or the host refusing individual calls.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use glam::{Affine3A, Vec2, Vec3};
use gridbuild_core::{MeshRef, Pose};
use gridbuild_modal::{
    recast_excluding, CursorStyle, HostError, InstanceHandle, InstanceKind, InstanceRequest,
    InstanceRole, Ray, RaycastHit, SceneHost, SceneQuery, TimerHandle,
};
use serde::Serialize;

/// Height of the default top-down camera.
pub const DEFAULT_CAMERA_HEIGHT: f32 = 100.0;

/// One instance stored by [`MemoryScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// World pose.
    pub pose: Pose,
    /// Kind of data carried.
    pub kind: InstanceKind,
    /// Placed block or preview.
    pub role: InstanceRole,
    /// Cloned mesh, `None` for the unit cube.
    pub mesh: Option<MeshRef>,
    /// Whether the user can select it.
    pub selectable: bool,
}

/// Serializable view of one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceSummary {
    /// Instance identity.
    pub handle: u64,
    /// World translation.
    pub position: [f32; 3],
    /// Cloned mesh name, if any.
    pub mesh: Option<String>,
    /// Whether the instance is a mesh.
    pub mesh_kind: bool,
    /// Selection state.
    pub selectable: bool,
}

/// Serializable snapshot of every persistent instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    /// Instances ordered by handle.
    pub instances: Vec<InstanceSummary>,
}

/// A scene that lives entirely in memory.
#[derive(Debug)]
pub struct MemoryScene {
    objects: BTreeMap<InstanceHandle, SceneObject>,
    meshes: BTreeSet<String>,
    next_handle: u64,
    viewport: bool,
    camera_height: f32,
    fixed_ray: Option<Ray>,
    cursor: Affine3A,
    cursor_style: CursorStyle,
    timers: HashMap<TimerHandle, Duration>,
    next_timer: u64,
    locked: BTreeSet<InstanceHandle>,
    refuse_timer_removal: bool,
    native_exclusion: bool,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    /// Empty scene with a usable viewport and the cursor at the origin.
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            meshes: BTreeSet::new(),
            next_handle: 1,
            viewport: true,
            camera_height: DEFAULT_CAMERA_HEIGHT,
            fixed_ray: None,
            cursor: Affine3A::IDENTITY,
            cursor_style: CursorStyle::Default,
            timers: HashMap::new(),
            next_timer: 1,
            locked: BTreeSet::new(),
            refuse_timer_removal: false,
            native_exclusion: true,
        }
    }

    /// Add a unit-cube block at `position`.
    pub fn add_block(&mut self, position: Vec3) -> InstanceHandle {
        self.add_object(Pose::from_translation(position), InstanceKind::Mesh)
    }

    /// Add an arbitrary persistent instance.
    pub fn add_object(&mut self, pose: Pose, kind: InstanceKind) -> InstanceHandle {
        self.insert(SceneObject {
            pose,
            kind,
            role: InstanceRole::Placed,
            mesh: None,
            selectable: true,
        })
    }

    /// Make a custom mesh available for cloning.
    pub fn register_mesh(&mut self, name: impl Into<String>) {
        self.meshes.insert(name.into());
    }

    /// Look up an instance.
    pub fn object(&self, handle: InstanceHandle) -> Option<&SceneObject> {
        self.objects.get(&handle)
    }

    /// Every instance, preview included, ordered by handle.
    pub fn objects(&self) -> impl Iterator<Item = (InstanceHandle, &SceneObject)> {
        self.objects.iter().map(|(handle, object)| (*handle, object))
    }

    /// Translations of every placed (non-preview) mesh instance.
    pub fn block_positions(&self) -> Vec<Vec3> {
        self.objects
            .values()
            .filter(|object| object.role == InstanceRole::Placed && object.kind == InstanceKind::Mesh)
            .map(|object| object.pose.translation)
            .collect()
    }

    /// Number of preview instances currently in the scene.
    pub fn preview_count(&self) -> usize {
        self.objects
            .values()
            .filter(|object| object.role == InstanceRole::Preview)
            .count()
    }

    /// Whether every instance is selectable.
    pub fn all_selectable(&self) -> bool {
        self.objects.values().all(|object| object.selectable)
    }

    /// Current pointer cursor style.
    pub fn cursor_style(&self) -> CursorStyle {
        self.cursor_style
    }

    /// Number of registered polling timers.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Interval of every registered timer.
    pub fn timer_intervals(&self) -> Vec<Duration> {
        self.timers.values().copied().collect()
    }

    /// Snapshot of every persistent instance.
    pub fn summary(&self) -> SceneSummary {
        let instances = self
            .objects
            .iter()
            .filter(|(_, object)| object.role == InstanceRole::Placed)
            .map(|(handle, object)| InstanceSummary {
                handle: handle.0,
                position: object.pose.translation.to_array(),
                mesh: object.mesh.as_ref().map(|mesh| mesh.name().to_string()),
                mesh_kind: object.kind == InstanceKind::Mesh,
                selectable: object.selectable,
            })
            .collect();
        SceneSummary { instances }
    }

    /// Pretend the session was started outside a 3D viewport.
    pub fn set_viewport_available(&mut self, available: bool) {
        self.viewport = available;
    }

    /// Move the 3D cursor without rotating it.
    pub fn set_cursor_location(&mut self, location: Vec3) {
        self.cursor.translation = location.into();
    }

    /// Replace the 3D cursor transform.
    pub fn set_cursor_transform(&mut self, transform: Affine3A) {
        self.cursor = transform;
    }

    /// Height of the top-down camera rays.
    pub fn set_camera_height(&mut self, height: f32) {
        self.camera_height = height;
    }

    /// Return `ray` for every pointer position instead of the camera ray.
    pub fn set_fixed_ray(&mut self, ray: Option<Ray>) {
        self.fixed_ray = ray;
    }

    /// Delete an instance the way a user would between two events.
    pub fn remove_out_of_band(&mut self, handle: InstanceHandle) -> bool {
        self.objects.remove(&handle).is_some()
    }

    /// Make `set_selectable` fail for `handle`.
    pub fn lock_selection(&mut self, handle: InstanceHandle) {
        self.locked.insert(handle);
    }

    /// Make `remove_timer` fail.
    pub fn refuse_timer_removal(&mut self, refuse: bool) {
        self.refuse_timer_removal = refuse;
    }

    /// Choose between filtering excluded instances inside the ray engine and
    /// the generic re-cast every host gets by default.
    pub fn set_native_exclusion(&mut self, native: bool) {
        self.native_exclusion = native;
    }

    fn nearest_hit(&self, ray: Ray, exclude: Option<InstanceHandle>) -> Option<RaycastHit> {
        let mut best: Option<(f32, RaycastHit)> = None;
        for (handle, object) in &self.objects {
            if Some(*handle) == exclude {
                continue;
            }
            let world = object.pose.to_affine();
            let inverse = world.inverse();
            let local_origin = inverse.transform_point3(ray.origin);
            let local_dir = inverse.transform_vector3(ray.direction);
            let Some((t, local_normal)) = intersect_unit_box(local_origin, local_dir) else {
                continue;
            };
            if best.as_ref().is_some_and(|(best_t, _)| *best_t <= t) {
                continue;
            }
            let normal = world.transform_vector3(local_normal).normalize_or_zero();
            best = Some((
                t,
                RaycastHit {
                    point: ray.at(t),
                    normal,
                    target: *handle,
                },
            ));
        }
        best.map(|(_, hit)| hit)
    }

    fn insert(&mut self, object: SceneObject) -> InstanceHandle {
        let handle = InstanceHandle(self.next_handle);
        self.next_handle += 1;
        self.objects.insert(handle, object);
        handle
    }
}

impl SceneQuery for MemoryScene {
    fn viewport_available(&self) -> bool {
        self.viewport
    }

    fn view_ray(&self, pointer: Vec2) -> Option<Ray> {
        Some(
            self.fixed_ray
                .unwrap_or_else(|| Ray::new(pointer.extend(self.camera_height), Vec3::NEG_Z)),
        )
    }

    fn cursor_transform(&self) -> Affine3A {
        self.cursor
    }

    fn raycast(&self, ray: Ray) -> Option<RaycastHit> {
        self.nearest_hit(ray, None)
    }

    fn raycast_excluding(&self, ray: Ray, exclude: InstanceHandle) -> Option<RaycastHit> {
        if self.native_exclusion {
            self.nearest_hit(ray, Some(exclude))
        } else {
            recast_excluding(self, ray, exclude)
        }
    }

    fn instances(&self) -> Vec<InstanceHandle> {
        self.objects.keys().copied().collect()
    }

    fn is_alive(&self, handle: InstanceHandle) -> bool {
        self.objects.contains_key(&handle)
    }

    fn instance_transform(&self, handle: InstanceHandle) -> Option<Affine3A> {
        self.objects.get(&handle).map(|object| object.pose.to_affine())
    }

    fn instance_kind(&self, handle: InstanceHandle) -> Option<InstanceKind> {
        self.objects.get(&handle).map(|object| object.kind)
    }
}

impl SceneHost for MemoryScene {
    fn create_instance(&mut self, request: &InstanceRequest) -> Result<InstanceHandle, HostError> {
        if let Some(mesh) = &request.mesh {
            if !self.meshes.contains(mesh.name()) {
                return Err(HostError::MissingMesh(mesh.name().to_string()));
            }
        }
        let handle = self.insert(SceneObject {
            pose: request.pose,
            kind: InstanceKind::Mesh,
            role: request.role,
            mesh: request.mesh.clone(),
            selectable: request.role == InstanceRole::Placed,
        });
        tracing::trace!(%handle, role = ?request.role, "Created instance");
        Ok(handle)
    }

    fn delete_instance(&mut self, handle: InstanceHandle) -> Result<(), HostError> {
        self.objects
            .remove(&handle)
            .ok_or(HostError::StaleInstance(handle))?;
        tracing::trace!(%handle, "Deleted instance");
        Ok(())
    }

    fn set_instance_pose(&mut self, handle: InstanceHandle, pose: Pose) -> Result<(), HostError> {
        let object = self
            .objects
            .get_mut(&handle)
            .ok_or(HostError::StaleInstance(handle))?;
        object.pose = pose;
        Ok(())
    }

    fn set_selectable(
        &mut self,
        handle: InstanceHandle,
        selectable: bool,
    ) -> Result<(), HostError> {
        if self.locked.contains(&handle) {
            return Err(HostError::Rejected(format!("selection of {handle} is locked")));
        }
        let object = self
            .objects
            .get_mut(&handle)
            .ok_or(HostError::StaleInstance(handle))?;
        // Previews stay unselectable no matter what.
        object.selectable = selectable && object.role == InstanceRole::Placed;
        Ok(())
    }

    fn set_cursor(&mut self, style: CursorStyle) {
        self.cursor_style = style;
    }

    fn add_timer(&mut self, interval: Duration) -> Result<TimerHandle, HostError> {
        let timer = TimerHandle(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(timer, interval);
        Ok(timer)
    }

    fn remove_timer(&mut self, timer: TimerHandle) -> Result<(), HostError> {
        if self.refuse_timer_removal {
            return Err(HostError::Rejected("timer removal refused".to_string()));
        }
        self.timers
            .remove(&timer)
            .map(|_| ())
            .ok_or(HostError::UnknownTimer(timer))
    }
}

/// Slab test against the box `[-0.5, 0.5]^3`.
///
/// Returns the entry distance and the local normal of the entry face. Rays that
/// start inside the box report nothing.
fn intersect_unit_box(origin: Vec3, direction: Vec3) -> Option<(f32, Vec3)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-8 {
            if !(-0.5..=0.5).contains(&o) {
                return None;
            }
            continue;
        }

        let mut near = (-0.5 - o) / d;
        let mut far = (0.5 - o) / d;
        // Entering through the -axis face when travelling +axis.
        let mut sign = -1.0;
        if near > far {
            std::mem::swap(&mut near, &mut far);
            sign = 1.0;
        }
        if near > t_enter {
            t_enter = near;
            normal = Vec3::ZERO;
            normal[axis] = sign;
        }
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    (t_enter >= 0.0).then_some((t_enter, normal))
}
