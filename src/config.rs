use anyhow::{Context, Result};
use gridbuild_core::PlacementSettings;
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_SETTINGS_PATH: &str = "config/placement.toml";

/// Load placement settings from an explicit path, falling back to defaults on errors.
///
/// The returned settings are clamped into their valid ranges.
pub fn load_settings(path: &Path) -> PlacementSettings {
    let settings = match fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<PlacementSettings>(&contents) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("Failed to parse {}: {err}. Using defaults", path.display());
                PlacementSettings::default()
            }
        },
        Err(err) => {
            if path != Path::new(DEFAULT_SETTINGS_PATH)
                || err.kind() != std::io::ErrorKind::NotFound
            {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
            } else {
                tracing::debug!(
                    "Placement settings not found at {}. Using defaults",
                    path.display()
                );
            }
            PlacementSettings::default()
        }
    };

    if let Err(err) = settings.validate() {
        warn!("Invalid placement settings in {}: {err}", path.display());
    }
    settings.sanitized()
}

/// Save placement settings to an explicit path.
pub fn save_settings(settings: &PlacementSettings, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(settings)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, toml).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
