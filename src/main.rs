//! gridbuild - grid-snapped block placement sessions
//!
//! Headless driver that replays a recorded input script against an in-memory scene

mod config;
mod headless;
mod scripted_input;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gridbuild_core::PlacementMode;
use headless::HeadlessConfig;
use scripted_input::EventScript;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay block placement sessions headlessly", long_about = None)]
struct Args {
    /// JSON event script to replay
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Placement settings (TOML)
    #[arg(long, default_value = config::DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    /// Override the placement mode (3d, 2d or view)
    #[arg(long)]
    mode: Option<String>,

    /// Write one JSON line per delivered event to this path
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// Height of the top-down camera above the ground plane
    #[arg(long)]
    camera_height: Option<f32>,

    /// Write the default settings to this path and exit
    #[arg(long)]
    write_default_settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting gridbuild v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    if let Some(path) = &args.write_default_settings {
        config::save_settings(&Default::default(), path)?;
        println!("Wrote default settings to {}", path.display());
        return Ok(());
    }

    let Some(script_path) = &args.script else {
        bail!("--script is required (or pass --write-default-settings)");
    };

    let mut settings = config::load_settings(&args.settings);
    if let Some(mode) = &args.mode {
        settings.placement_mode = PlacementMode::parse(mode)
            .with_context(|| format!("unknown placement mode '{mode}'"))?;
    }

    let script = EventScript::from_path(script_path)
        .with_context(|| format!("failed to load script {}", script_path.display()))?;

    let report = headless::run(HeadlessConfig {
        settings,
        script,
        event_log: args.event_log.clone(),
        camera_height: args.camera_height,
    })?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
