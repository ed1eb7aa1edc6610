//! Capabilities the placement session needs from the host editor.
//!
//! The host owns the scene graph, the ray engine, the cursor and the timer
//! service. Instance handles are opaque and may go stale at any time (the user
//! can delete anything between two events), so every mutating call is
//! fallible and callers check [`SceneQuery::is_alive`] before relying on one.

use std::fmt;
use std::time::Duration;

use glam::{Affine3A, Vec2, Vec3};
use gridbuild_core::{MeshRef, Pose};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identity of a scene instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceHandle(pub u64);

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque identity of a registered polling timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// What kind of data an instance carries.
///
/// Only [`InstanceKind::Mesh`] instances are valid placement anchors and
/// deletion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceKind {
    /// Mesh geometry (blocks, imported meshes).
    Mesh,
    /// Anything else the host tracks (lights, cameras, empties).
    Other,
}

/// How a new instance is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceRole {
    /// A regular, persistent, selectable block.
    Placed,
    /// The session's wireframe preview: not selectable, not rendered, never
    /// persisted.
    Preview,
}

/// Pointer cursor styles the session switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorStyle {
    /// The host's normal cursor.
    #[default]
    Default,
    /// Shown while the placement session is active.
    Busy,
}

/// Everything the host needs to create an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRequest {
    /// World pose of the new instance.
    pub pose: Pose,
    /// Mesh to clone; `None` creates a unit cube.
    pub mesh: Option<MeshRef>,
    /// Presentation role.
    pub role: InstanceRole,
}

/// A world-space ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Vec3,
    /// Ray direction (not required to be normalized).
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t`.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Nearest intersection reported by the host ray engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// World-space hit point.
    pub point: Vec3,
    /// World-space surface normal at the hit point.
    pub normal: Vec3,
    /// Instance that was hit.
    pub target: InstanceHandle,
}

/// Distance a re-cast starts past the previous hit point.
pub const RECAST_STEP: f32 = 1e-3;

/// Re-casts allowed before giving up on reaching past an excluded instance.
pub const MAX_RECASTS: usize = 8;

/// Walk along `ray` with plain [`SceneQuery::raycast`] calls, restarting just
/// past every hit on `exclude`, until something else is hit.
///
/// Relies on the host not reporting the surface a ray starts inside of.
/// Geometry coincident with `exclude` may be skipped along with it.
pub fn recast_excluding<H: SceneQuery + ?Sized>(
    host: &H,
    ray: Ray,
    exclude: InstanceHandle,
) -> Option<RaycastHit> {
    let step = ray.direction.normalize_or_zero() * RECAST_STEP;
    let mut origin = ray.origin;
    for _ in 0..=MAX_RECASTS {
        let hit = host.raycast(Ray::new(origin, ray.direction))?;
        if hit.target != exclude {
            return Some(hit);
        }
        origin = hit.point + step;
    }
    None
}

/// Errors returned by host calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The handle no longer refers to a live instance.
    #[error("instance {0} no longer exists")]
    StaleInstance(InstanceHandle),
    /// The requested custom mesh does not exist.
    #[error("mesh {0:?} not found")]
    MissingMesh(String),
    /// The timer was never registered or was already removed.
    #[error("timer {0:?} is not registered")]
    UnknownTimer(TimerHandle),
    /// Any other host-side failure.
    #[error("host rejected the request: {0}")]
    Rejected(String),
}

/// Read-only scene queries.
pub trait SceneQuery {
    /// Whether the session was started from a usable 3D viewport.
    fn viewport_available(&self) -> bool;

    /// World-space ray under the pointer, in viewport region coordinates.
    fn view_ray(&self, pointer: Vec2) -> Option<Ray>;

    /// World transform of the 3D cursor (reference point and ground plane).
    fn cursor_transform(&self) -> Affine3A;

    /// Nearest hit along `ray`, if any. Every instance counts, the preview
    /// included.
    fn raycast(&self, ray: Ray) -> Option<RaycastHit>;

    /// Nearest hit along `ray` on anything but `exclude`.
    ///
    /// Hosts whose ray engine can filter instances should override this. The
    /// default re-casts past each hit on `exclude`; see [`recast_excluding`].
    fn raycast_excluding(&self, ray: Ray, exclude: InstanceHandle) -> Option<RaycastHit> {
        recast_excluding(self, ray, exclude)
    }

    /// Every live instance in the scene.
    fn instances(&self) -> Vec<InstanceHandle>;

    /// Whether `handle` still refers to a live instance.
    fn is_alive(&self, handle: InstanceHandle) -> bool;

    /// World transform of a live instance.
    fn instance_transform(&self, handle: InstanceHandle) -> Option<Affine3A>;

    /// Kind of a live instance.
    fn instance_kind(&self, handle: InstanceHandle) -> Option<InstanceKind>;
}

/// Scene mutations and session plumbing.
pub trait SceneHost: SceneQuery {
    /// Create an instance and hand ownership to the scene.
    fn create_instance(&mut self, request: &InstanceRequest) -> Result<InstanceHandle, HostError>;

    /// Remove an instance from the scene.
    fn delete_instance(&mut self, handle: InstanceHandle) -> Result<(), HostError>;

    /// Move an existing instance.
    fn set_instance_pose(&mut self, handle: InstanceHandle, pose: Pose) -> Result<(), HostError>;

    /// Toggle whether the user can select an instance.
    fn set_selectable(&mut self, handle: InstanceHandle, selectable: bool)
        -> Result<(), HostError>;

    /// Switch the pointer cursor.
    fn set_cursor(&mut self, style: CursorStyle);

    /// Register a periodic tick delivered as [`crate::EventKind::Tick`].
    fn add_timer(&mut self, interval: Duration) -> Result<TimerHandle, HostError>;

    /// Unregister a periodic tick.
    fn remove_timer(&mut self, timer: TimerHandle) -> Result<(), HostError>;
}
