use glam::{Vec2, Vec3};
use gridbuild_core::PlacementMode;
use gridbuild_modal::{Event, EventKind};
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

/// A recorded input session replayed by the headless driver.
#[derive(Debug, Clone, Deserialize)]
pub struct EventScript {
    /// Initial 3D cursor location.
    #[serde(default)]
    pub cursor: [f32; 3],
    /// Blocks present before the session starts.
    #[serde(default)]
    pub blocks: Vec<[f32; 3]>,
    pub steps: Vec<ScriptedStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedStep {
    /// Milliseconds since the session started.
    pub at_ms: u64,
    pub event: EventKind,
    #[serde(default)]
    pub pointer: [f32; 2],
    /// Switch the placement mode from this step on.
    #[serde(default)]
    pub mode: Option<PlacementMode>,
    /// Move the 3D cursor before this step is delivered.
    #[serde(default)]
    pub cursor: Option<[f32; 3]>,
}

impl EventScript {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        let script: EventScript = serde_json::from_str(contents)?;
        if script.steps.is_empty() {
            anyhow::bail!("event script contains no steps");
        }
        if let Some(pair) = script
            .steps
            .windows(2)
            .find(|pair| pair[1].at_ms < pair[0].at_ms)
        {
            anyhow::bail!(
                "event script goes back in time ({} ms after {} ms)",
                pair[1].at_ms,
                pair[0].at_ms
            );
        }
        Ok(script)
    }

    pub fn cursor(&self) -> Vec3 {
        Vec3::from_array(self.cursor)
    }

    pub fn blocks(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.blocks.iter().copied().map(Vec3::from_array)
    }
}

impl ScriptedStep {
    pub fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }

    pub fn to_event(&self) -> Event {
        Event::new(self.event, Vec2::from_array(self.pointer), self.at())
    }
}
