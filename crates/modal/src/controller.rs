//! The modal placement session.
//!
//! A session is created by [`ModalController::invoke`], fed one host event at
//! a time through [`ModalController::step`], and ends on a cancel event or a
//! forced [`ModalController::shutdown`]. Either way the same cleanup runs
//! exactly once and puts the scene back the way the user left it.

use std::sync::Arc;

use glam::Vec3;
use gridbuild_core::PlacementSettings;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::event::{Button, Event, EventKind, Response};
use crate::host::{
    CursorStyle, HostError, InstanceHandle, InstanceRequest, InstanceRole, SceneHost, TimerHandle,
};
use crate::preview::PreviewManager;
use crate::rate::{Operation, RateController};
use crate::registry::{SessionGuard, SessionRegistry};
use crate::resolver::{placeable_hit, resolve_candidate, Purpose, ViewContext};

/// Reasons a session refuses to start.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Invoked outside a 3D viewport.
    #[error("block placement needs an active 3D viewport")]
    NoViewport,
    /// Another session already owns the scene.
    #[error("a placement session is already running")]
    AlreadyRunning,
    /// The host refused to register the polling timer.
    #[error("failed to register the polling timer: {0}")]
    Timer(#[source] HostError),
}

/// Lifecycle of a session once invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Processing events.
    Active,
    /// Cleaned up; every further event reports [`Response::Cancelled`].
    Terminated,
}

/// Running totals for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Blocks created.
    pub placed: usize,
    /// Blocks removed.
    pub deleted: usize,
}

/// Modal state machine driving placement, deletion and the preview.
#[derive(Debug)]
pub struct ModalController {
    phase: SessionPhase,
    rate: RateController,
    preview: PreviewManager,
    timer: Option<TimerHandle>,
    guard: Option<SessionGuard>,
    /// Settings as last handed in by the panel.
    requested: PlacementSettings,
    /// `requested` with out-of-range values clamped.
    settings: PlacementSettings,
    stats: SessionStats,
}

impl ModalController {
    /// Start a session against the process-wide registry.
    pub fn invoke<H: SceneHost + ?Sized>(
        host: &mut H,
        settings: &PlacementSettings,
    ) -> Result<Self, SessionError> {
        Self::invoke_in(host, settings, SessionRegistry::global())
    }

    /// Start a session against an explicit registry.
    ///
    /// Nothing in the scene is touched unless the session actually starts.
    pub fn invoke_in<H: SceneHost + ?Sized>(
        host: &mut H,
        settings: &PlacementSettings,
        registry: Arc<SessionRegistry>,
    ) -> Result<Self, SessionError> {
        if !host.viewport_available() {
            warn!("Block placement must be started from a 3D viewport");
            return Err(SessionError::NoViewport);
        }
        let Some(guard) = registry.try_claim() else {
            warn!("Block placement is already running");
            return Err(SessionError::AlreadyRunning);
        };

        let effective = settings.sanitized();
        let timer = host
            .add_timer(effective.tick_interval())
            .map_err(SessionError::Timer)?;

        for handle in host.instances() {
            if let Err(err) = host.set_selectable(handle, false) {
                warn!(%handle, %err, "Failed to lock instance selection");
            }
        }
        host.set_cursor(CursorStyle::Busy);

        let mut controller = Self {
            phase: SessionPhase::Active,
            rate: RateController::new(),
            preview: PreviewManager::new(),
            timer: Some(timer),
            guard: Some(guard),
            requested: settings.clone(),
            settings: effective,
            stats: SessionStats::default(),
        };

        if controller.settings.show_preview {
            let start = controller
                .settings
                .grid()
                .snap(host.cursor_transform().translation.into());
            if let Err(err) = controller.preview.sync(host, &controller.settings, start) {
                warn!(%err, "Failed to create placement preview");
            }
        }

        info!(
            mode = %controller.settings.placement_mode,
            speed = controller.settings.placement_speed,
            preview = controller.settings.show_preview,
            "Placement session started"
        );
        Ok(controller)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the session still processes events.
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Whether the place button is held.
    pub fn is_placing(&self) -> bool {
        self.rate.is_placing()
    }

    /// Whether the delete button is held.
    pub fn is_deleting(&self) -> bool {
        self.rate.is_deleting()
    }

    /// Most recent placement since the place button went down.
    pub fn last_placement(&self) -> Option<Vec3> {
        self.rate.last_placement()
    }

    /// Handle of the live preview, if any.
    pub fn preview_handle(&self) -> Option<InstanceHandle> {
        self.preview.handle()
    }

    /// Blocks placed and deleted so far.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Process one host event.
    ///
    /// `settings` is the panel's current state; it may change between events.
    pub fn step<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        settings: &PlacementSettings,
        event: &Event,
    ) -> Response {
        if self.phase == SessionPhase::Terminated {
            return Response::Cancelled;
        }
        if event.kind == EventKind::Cancel {
            self.cleanup(host);
            return Response::Cancelled;
        }

        self.refresh_settings(host, settings);

        match event.kind {
            EventKind::Press(Button::Primary) => {
                self.rate.press_place();
                return Response::Consumed;
            }
            EventKind::Release(Button::Primary) => {
                self.rate.release_place();
                return Response::Consumed;
            }
            EventKind::Press(Button::Secondary) => {
                self.rate.press_delete();
                return Response::Consumed;
            }
            EventKind::Release(Button::Secondary) => {
                self.rate.release_delete();
                return Response::Consumed;
            }
            _ => {}
        }

        let show_preview = self.settings.show_preview;
        if !show_preview && self.preview.handle().is_some() {
            self.preview.remove(host);
        }
        if !(self.rate.is_placing() || self.rate.is_deleting() || show_preview) {
            return Response::PassThrough;
        }

        let Some(view) = ViewContext::capture(host, event.pointer) else {
            trace!(pointer = %event.pointer, "No view ray under pointer");
            return Response::PassThrough;
        };

        if show_preview {
            let candidate = resolve_candidate(
                host,
                &self.settings,
                &view,
                Purpose::Preview,
                self.preview.handle(),
            );
            if let Some(position) = candidate {
                if let Err(err) = self.preview.sync(host, &self.settings, position) {
                    warn!(%err, "Failed to update placement preview");
                }
            }
        }

        if let Some(operation) = self.rate.pending() {
            if self
                .rate
                .is_open(event.at, self.settings.placement_interval())
            {
                self.rate.mark(event.at);
                match operation {
                    Operation::Place => self.commit_placement(host, &view),
                    Operation::Delete => self.commit_deletion(host, &view),
                }
            }
        }

        Response::Consumed
    }

    /// Forced termination (host shutdown, operator replaced). Runs the same
    /// cleanup as a cancel event; calling it twice is harmless.
    pub fn shutdown<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        self.cleanup(host);
    }

    fn refresh_settings<H: SceneHost + ?Sized>(&mut self, host: &mut H, settings: &PlacementSettings) {
        if settings.same_as(&self.requested) {
            return;
        }
        let previous_tick = self.settings.tick_interval();
        self.requested = settings.clone();
        self.settings = settings.sanitized();

        let tick = self.settings.tick_interval();
        if tick != previous_tick {
            if let Some(timer) = self.timer.take() {
                if let Err(err) = host.remove_timer(timer) {
                    warn!(%err, "Failed to remove polling timer");
                }
            }
            match host.add_timer(tick) {
                Ok(timer) => self.timer = Some(timer),
                Err(err) => warn!(%err, "Failed to re-register polling timer"),
            }
        }
    }

    fn commit_placement<H: SceneHost + ?Sized>(&mut self, host: &mut H, view: &ViewContext) {
        let Some(candidate) = resolve_candidate(
            host,
            &self.settings,
            view,
            Purpose::Commit,
            self.preview.handle(),
        ) else {
            return;
        };
        if self.rate.is_duplicate(candidate) {
            trace!(%candidate, "Skipping duplicate placement");
            return;
        }

        match create_block(host, &self.settings, candidate) {
            Ok(handle) => {
                self.rate.record_placement(candidate);
                self.stats.placed += 1;
                debug!(%handle, position = %candidate, "Placed block");
            }
            Err(err) => warn!(%err, position = %candidate, "Failed to place block"),
        }
    }

    fn commit_deletion<H: SceneHost + ?Sized>(&mut self, host: &mut H, view: &ViewContext) {
        let Some(hit) = placeable_hit(host, view.ray, self.preview.handle()) else {
            return;
        };
        if !host.is_alive(hit.target) {
            return;
        }
        match host.delete_instance(hit.target) {
            Ok(()) => {
                self.stats.deleted += 1;
                debug!(handle = %hit.target, "Deleted block");
            }
            Err(err) => warn!(handle = %hit.target, %err, "Failed to delete block"),
        }
    }

    fn cleanup<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        if self.phase == SessionPhase::Terminated {
            return;
        }
        self.phase = SessionPhase::Terminated;

        if let Some(timer) = self.timer.take() {
            if let Err(err) = host.remove_timer(timer) {
                warn!(%err, "Failed to remove polling timer");
            }
        }

        self.preview.remove(host);

        for handle in host.instances() {
            if !host.is_alive(handle) {
                continue;
            }
            if let Err(err) = host.set_selectable(handle, true) {
                warn!(%handle, %err, "Failed to restore instance selection");
            }
        }

        host.set_cursor(CursorStyle::Default);
        self.guard = None;

        info!(
            placed = self.stats.placed,
            deleted = self.stats.deleted,
            "Placement session ended"
        );
    }
}

impl Drop for ModalController {
    fn drop(&mut self) {
        if self.phase == SessionPhase::Active {
            warn!("Placement session dropped without cleanup; scene state was not restored");
        }
    }
}

/// Create a placed block, falling back to the unit cube if the custom mesh is
/// gone.
fn create_block<H: SceneHost + ?Sized>(
    host: &mut H,
    settings: &PlacementSettings,
    position: Vec3,
) -> Result<InstanceHandle, HostError> {
    let mut request = InstanceRequest {
        pose: settings.transform().pose_at(position),
        mesh: settings.source_mesh().cloned(),
        role: InstanceRole::Placed,
    };
    match host.create_instance(&request) {
        Err(HostError::MissingMesh(name)) => {
            warn!(mesh = %name, "Custom mesh missing; placing a cube instead");
            request.mesh = None;
            host.create_instance(&request)
        }
        result => result,
    }
}
