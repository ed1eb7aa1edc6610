#![warn(missing_docs)]
//! Testing surfaces: an in-memory host scene and event log plumbing.

mod memory_scene;

use anyhow::{Context, Result};
use gridbuild_modal::{EventKind, Response};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use memory_scene::*;

/// One processed event, as captured by headless runs.
#[derive(Debug, Serialize)]
pub struct EventRecord {
    /// Event timestamp in milliseconds.
    pub at_ms: u64,
    /// Event type.
    pub kind: EventKind,
    /// Pointer position in viewport coordinates.
    pub pointer: [f32; 2],
    /// How the session disposed of the event.
    pub response: Response,
    /// Blocks placed so far in the session.
    pub placed: usize,
    /// Blocks deleted so far in the session.
    pub deleted: usize,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self { file })
    }

    /// Append a record to the log.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}
