// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Settings are read from a YAML file: the path in `OVARA_CONFIG`, else
//! `ovara.yaml` in the working directory. Missing fields and a missing
//! default file fall back to built-in defaults.

use crate::editor::modes::{ClickMode, ImageFitMode};
use crate::editor::session::EditorSettings;
use crate::models::store::DEFAULT_PALETTE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "OVARA_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ovara.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the project collection is persisted (`.json` or `.yaml`).
    pub state_file: PathBuf,
    /// Smallest accepted box edge in screen pixels.
    pub min_box_size: f64,
    pub zoom_aspect_lock: bool,
    pub click_mode: ClickMode,
    pub image_fit_mode: ImageFitMode,
    /// Annotation colors as `#rrggbb`.
    pub palette: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("ovara-projects.json"),
            min_box_size: 5.0,
            zoom_aspect_lock: true,
            click_mode: ClickMode::Drag,
            image_fit_mode: ImageFitMode::Fit,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Resolve and load the configuration for this process.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_yaml(&text).with_context(|| format!("Invalid config {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        if config.min_box_size < 0.0 {
            anyhow::bail!("min_box_size must not be negative");
        }
        Ok(config)
    }

    pub fn editor_settings(&self) -> EditorSettings {
        EditorSettings {
            min_box_size: self.min_box_size,
            zoom_aspect_lock: self.zoom_aspect_lock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = AppConfig::from_yaml("click_mode: click\nmin_box_size: 8\n").unwrap();
        assert_eq!(config.click_mode, ClickMode::Click);
        assert_eq!(config.min_box_size, 8.0);
        assert_eq!(config.image_fit_mode, ImageFitMode::Fit);
        assert!(config.zoom_aspect_lock);
        assert_eq!(config.palette.len(), DEFAULT_PALETTE.len());
    }

    #[test]
    fn test_rejects_negative_threshold() {
        assert!(AppConfig::from_yaml("min_box_size: -1.0").is_err());
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(AppConfig::from_yaml("image_fit_mode: squash").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ovara.yaml");
        fs::write(&path, "state_file: /tmp/state.yaml\nzoom_aspect_lock: false\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.state_file, PathBuf::from("/tmp/state.yaml"));
        assert!(!config.editor_settings().zoom_aspect_lock);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(AppConfig::from_file(&dir.path().join("nope.yaml")).is_err());
    }
}
