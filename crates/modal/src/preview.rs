//! The wireframe preview block.
//!
//! At most one preview exists per session. It is created lazily, follows the
//! candidate position, and is rebuilt whenever the host destroyed it behind
//! our back or the source mesh changed.

use glam::Vec3;
use gridbuild_core::{MeshRef, PlacementSettings};
use tracing::{debug, warn};

use crate::host::{HostError, InstanceHandle, InstanceRequest, InstanceRole, SceneHost};

/// Owner of the session's preview instance.
#[derive(Debug, Default)]
pub struct PreviewManager {
    handle: Option<InstanceHandle>,
    /// Mesh the settings asked for when the preview was built. The live
    /// instance may be a cube if that mesh was missing.
    mesh: Option<MeshRef>,
}

impl PreviewManager {
    /// A manager with no preview yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current preview handle, if one was created.
    pub fn handle(&self) -> Option<InstanceHandle> {
        self.handle
    }

    /// Whether `handle` is the preview.
    pub fn is_preview(&self, handle: InstanceHandle) -> bool {
        self.handle == Some(handle)
    }

    /// Make sure a preview exists at `position` with the current transform.
    ///
    /// A custom mesh the host does not know is previewed as the unit cube,
    /// matching what a placement would create.
    pub fn sync<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        settings: &PlacementSettings,
        position: Vec3,
    ) -> Result<InstanceHandle, HostError> {
        let pose = settings.transform().pose_at(position);
        let mesh = settings.source_mesh().cloned();

        if let Some(handle) = self.handle {
            if mesh != self.mesh {
                debug!(%handle, "Preview mesh changed; rebuilding");
                self.remove(host);
            } else if host.is_alive(handle) {
                match host.set_instance_pose(handle, pose) {
                    Ok(()) => return Ok(handle),
                    Err(HostError::StaleInstance(_)) => {
                        debug!(%handle, "Preview went stale during update; recreating");
                    }
                    Err(err) => return Err(err),
                }
                self.handle = None;
            } else {
                debug!(%handle, "Preview removed by host; recreating");
                self.handle = None;
            }
        }

        let mut request = InstanceRequest {
            pose,
            mesh: mesh.clone(),
            role: InstanceRole::Preview,
        };
        let handle = match host.create_instance(&request) {
            Err(HostError::MissingMesh(name)) => {
                warn!(mesh = %name, "Custom mesh missing; previewing a cube instead");
                request.mesh = None;
                host.create_instance(&request)?
            }
            result => result?,
        };
        debug!(%handle, %position, "Created preview");
        self.handle = Some(handle);
        self.mesh = mesh;
        Ok(handle)
    }

    /// Destroy the preview. Safe to call when none exists.
    pub fn remove<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        self.mesh = None;
        let Some(handle) = self.handle.take() else {
            return;
        };
        if !host.is_alive(handle) {
            return;
        }
        if let Err(err) = host.delete_instance(handle) {
            warn!(%handle, %err, "Failed to delete preview");
        }
    }
}
