#![warn(missing_docs)]
//! Modal grid block placement.
//!
//! A [`ModalController`] turns a stream of pointer, button and timer events
//! into block creations and deletions against a host scene, with a live
//! wireframe preview of where the next block will land. The host is reached
//! only through the [`SceneQuery`] / [`SceneHost`] traits.

mod controller;
mod event;
mod host;
mod preview;
mod rate;
mod registry;
mod resolver;

pub use controller::{ModalController, SessionError, SessionPhase, SessionStats};
pub use event::{Button, Event, EventKind, Response};
pub use host::{
    recast_excluding, CursorStyle, HostError, InstanceHandle, InstanceKind, InstanceRequest,
    InstanceRole, Ray, RaycastHit, SceneHost, SceneQuery, TimerHandle, MAX_RECASTS, RECAST_STEP,
};
pub use preview::PreviewManager;
pub use rate::{Operation, RateController, DUPLICATE_EPSILON};
pub use registry::{SessionGuard, SessionRegistry};
pub use resolver::{
    intersect_cursor_plane, placeable_hit, resolve_candidate, Purpose, ViewContext,
    EMPTY_SPACE_COMMIT_Z, PLANE_PARALLEL_EPSILON,
};
