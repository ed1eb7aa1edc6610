use crate::scripted_input::EventScript;
use anyhow::{Context, Result};
use glam::Vec2;
use gridbuild_core::PlacementSettings;
use gridbuild_modal::{
    Event, EventKind, ModalController, Response, SessionRegistry, SessionStats,
};
use gridbuild_testkit::{EventRecord, JsonlSink, MemoryScene, SceneSummary};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub struct HeadlessConfig {
    pub settings: PlacementSettings,
    pub script: EventScript,
    pub event_log: Option<PathBuf>,
    pub camera_height: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub events: usize,
    pub placed: usize,
    pub deleted: usize,
    /// Whether the script ended the session itself (as opposed to a forced stop).
    pub cancelled_by_script: bool,
    pub scene: SceneSummary,
}

pub fn run(cfg: HeadlessConfig) -> Result<RunReport> {
    run_with_registry(cfg, SessionRegistry::global())
}

pub fn run_with_registry(cfg: HeadlessConfig, registry: Arc<SessionRegistry>) -> Result<RunReport> {
    let mut scene = MemoryScene::new();
    scene.set_cursor_location(cfg.script.cursor());
    if let Some(height) = cfg.camera_height {
        scene.set_camera_height(height);
    }
    for position in cfg.script.blocks() {
        scene.add_block(position);
    }

    let mut sink = match &cfg.event_log {
        Some(path) => Some(
            JsonlSink::create(path)
                .with_context(|| format!("failed to open event log {}", path.display()))?,
        ),
        None => None,
    };

    let mut settings = cfg.settings;
    let mut session = ModalController::invoke_in(&mut scene, &settings, registry)
        .context("failed to start placement session")?;
    tracing::info!(steps = cfg.script.steps.len(), "Replaying event script");

    let mut events = 0usize;
    let mut pointer = Vec2::ZERO;
    let mut next_tick = settings.tick_interval();
    let mut cancelled_by_script = false;

    'script: for step in &cfg.script.steps {
        // Deliver the polling ticks the host timer would have fired meanwhile.
        while next_tick < step.at() {
            let tick = Event::new(EventKind::Tick, pointer, next_tick);
            let response = session.step(&mut scene, &settings, &tick);
            events += 1;
            log_event(&mut sink, &tick, response, session.stats())?;
            next_tick += settings.tick_interval();
        }

        if let Some(mode) = step.mode {
            settings.placement_mode = mode;
        }
        if let Some(cursor) = step.cursor {
            scene.set_cursor_location(glam::Vec3::from_array(cursor));
        }

        let event = step.to_event();
        pointer = event.pointer;
        let response = session.step(&mut scene, &settings, &event);
        events += 1;
        log_event(&mut sink, &event, response, session.stats())?;
        if response == Response::Cancelled {
            cancelled_by_script = true;
            break 'script;
        }
    }

    if session.is_active() {
        tracing::debug!("Script ended with the session still active; forcing shutdown");
        session.shutdown(&mut scene);
    }

    let stats = session.stats();
    Ok(RunReport {
        events,
        placed: stats.placed,
        deleted: stats.deleted,
        cancelled_by_script,
        scene: scene.summary(),
    })
}

fn log_event(
    sink: &mut Option<JsonlSink>,
    event: &Event,
    response: Response,
    stats: SessionStats,
) -> Result<()> {
    let Some(sink) = sink else {
        return Ok(());
    };
    sink.write(&EventRecord {
        at_ms: duration_ms(event.at),
        kind: event.kind,
        pointer: event.pointer.to_array(),
        response,
        placed: stats.placed,
        deleted: stats.deleted,
    })
}

fn duration_ms(at: Duration) -> u64 {
    u64::try_from(at.as_millis()).unwrap_or(u64::MAX)
}
