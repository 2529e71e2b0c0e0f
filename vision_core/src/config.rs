//! Configuration for the visibility subsystem.
//!
//! Loaded from `vision_settings.json` with support for an environment
//! variable override (`VISION_CONFIG_PATH`). Every field has a default so a
//! partial file is always valid.

use std::{
    collections::HashMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

use crate::coords::{WorldConfig, WorldConfigError};

pub const BUILTIN_VISION_SETTINGS: &str = include_str!("data/vision_settings.json");

/// Root configuration for the visibility subsystem.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    /// World-space corner of the map (x, z).
    pub bounds_min: [f32; 2],
    /// Opposite world-space corner of the map (x, z).
    pub bounds_max: [f32; 2],
    /// World units per grid cell.
    pub cell_size: f32,
    /// Seconds between aggregation sweeps.
    pub update_interval_secs: f32,
    /// Maximum cells tested per update invocation; larger sweeps carry over.
    pub max_cells_per_pass: usize,
    pub brightness: BrightnessLevels,
    /// Per entity kind: hide the entity while its cell is merely Explored.
    /// Units default to true, buildings persist as remembered silhouettes.
    pub hide_in_explored: HashMap<String, bool>,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            bounds_min: [0.0, 0.0],
            bounds_max: [256.0, 256.0],
            cell_size: 2.0,
            update_interval_secs: 0.1,
            max_cells_per_pass: 512,
            brightness: BrightnessLevels::default(),
            hide_in_explored: default_hide_in_explored(),
        }
    }
}

fn default_hide_in_explored() -> HashMap<String, bool> {
    let mut kinds = HashMap::new();
    kinds.insert("unit".to_string(), true);
    kinds.insert("building".to_string(), false);
    kinds
}

impl VisionSettings {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_VISION_SETTINGS)
                .expect("builtin vision settings should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = VisionSettings::from_json_str(&contents)?;
        Ok(settings)
    }

    /// Build the canonical [`WorldConfig`] these settings describe.
    pub fn world_config(&self) -> Result<WorldConfig, WorldConfigError> {
        WorldConfig::new(
            Vec2::from_array(self.bounds_min),
            Vec2::from_array(self.bounds_max),
            self.cell_size,
        )
    }

    /// Sweep interval as a [`Duration`].
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs_f32(self.update_interval_secs.max(0.0))
    }

    /// Hide-in-explored policy for an entity kind. Unknown kinds fall back
    /// to true: hide unless currently seen.
    pub fn hide_in_explored_for(&self, kind: &str) -> bool {
        self.hide_in_explored.get(kind).copied().unwrap_or(true)
    }
}

/// Brightness applied by the world dimming overlay per cell state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrightnessLevels {
    pub visible: f32,
    pub explored: f32,
    pub unexplored: f32,
}

impl Default for BrightnessLevels {
    fn default() -> Self {
        Self {
            visible: 1.0,
            explored: 0.45,
            unexplored: 0.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse vision settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read vision settings from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle for accessing the vision settings.
#[derive(Debug, Clone)]
pub struct VisionSettingsHandle(pub Arc<VisionSettings>);

impl VisionSettingsHandle {
    pub fn new(settings: Arc<VisionSettings>) -> Self {
        Self(settings)
    }

    pub fn get(&self) -> Arc<VisionSettings> {
        Arc::clone(&self.0)
    }

    pub fn replace(&mut self, settings: Arc<VisionSettings>) {
        self.0 = settings;
    }
}

/// Metadata about where the active settings came from.
#[derive(Debug, Clone)]
pub struct SettingsMetadata {
    path: Option<PathBuf>,
}

impl SettingsMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Load vision settings from the `VISION_CONFIG_PATH` override if set,
/// falling back to the builtin defaults on any failure.
pub fn load_settings_from_env() -> (Arc<VisionSettings>, SettingsMetadata) {
    if let Some(path) = env::var("VISION_CONFIG_PATH").ok().map(PathBuf::from) {
        match VisionSettings::from_file(&path) {
            Ok(settings) => {
                tracing::info!(
                    target: "ashfield::config",
                    path = %path.display(),
                    "vision_settings.loaded=file"
                );
                return (Arc::new(settings), SettingsMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "ashfield::config",
                    path = %path.display(),
                    error = %err,
                    "vision_settings.load_failed"
                );
            }
        }
    }

    let settings = VisionSettings::builtin();
    tracing::info!(
        target: "ashfield::config",
        "vision_settings.loaded=builtin"
    );
    (settings, SettingsMetadata::new(None))
}
