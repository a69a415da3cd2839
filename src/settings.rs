use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "versicle";

/// Reader-tunable knobs for the content engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Token inserted before a verse that does not follow its predecessor
    /// in a reconstructed passage. The source application used both "-- "
    /// and "... " for this; it is one configurable marker here.
    #[serde(default = "default_gap_marker")]
    pub gap_marker: String,

    /// Fixed alpha applied to highlight overlay colors so the underlying
    /// text stays legible regardless of theme.
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: f32,

    /// Hex colors offered for highlighting.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

fn default_gap_marker() -> String {
    "... ".to_string()
}

fn default_overlay_alpha() -> f32 {
    0.55
}

fn default_palette() -> Vec<String> {
    vec![
        "#FFD700".to_string(),
        "#90EE90".to_string(),
        "#87CEEB".to_string(),
        "#FFB6C1".to_string(),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gap_marker: default_gap_marker(),
            overlay_alpha: default_overlay_alpha(),
            palette: default_palette(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// A snapshot of the current settings.
pub fn current() -> Settings {
    SETTINGS
        .read()
        .map(|guard| guard.clone())
        .unwrap_or_default()
}

pub fn set(settings: Settings) {
    if let Ok(mut guard) = SETTINGS.write() {
        *guard = settings;
    }
}

/// Loads settings from the user config file into the process-wide state,
/// falling back to defaults when the file is missing or unreadable.
pub fn load() {
    match config_path() {
        Some(path) if path.exists() => match load_from(&path) {
            Ok(settings) => {
                info!("loaded settings from {}", path.display());
                set(settings);
            }
            Err(err) => {
                warn!("failed to load settings from {}: {err}", path.display());
                set(Settings::default());
            }
        },
        _ => set(Settings::default()),
    }
}

pub fn load_from(path: &Path) -> anyhow::Result<Settings> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

pub fn save_to(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_yaml::to_string(settings)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let settings = Settings {
            gap_marker: "-- ".to_string(),
            overlay_alpha: 0.5,
            ..Settings::default()
        };
        save_to(&settings, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "gap_marker: '-- '\n").unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.gap_marker, "-- ");
        assert_eq!(loaded.overlay_alpha, default_overlay_alpha());
        assert_eq!(loaded.palette, default_palette());
    }
}
