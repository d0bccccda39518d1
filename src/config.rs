// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tracking configuration.
//!
//! The configuration names the root folder to walk, the frame file
//! extension, the export scaling factor and the variable names assigned to
//! folder path segments. It is read from JSON or YAML.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tracking_config.json";

/// Parameters of the native template tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerParams {
    /// Pixels the target may move between two frames
    #[serde(default = "default_search_radius")]
    pub search_radius: u32,
    /// Lowest correlation accepted as a match (-1.0 to 1.0)
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            search_radius: default_search_radius(),
            min_score: default_min_score(),
        }
    }
}

fn default_search_radius() -> u32 {
    24
}

fn default_min_score() -> f32 {
    0.5
}

fn default_tracker() -> String {
    "MIL".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root path walked for leaf folders
    pub folder: PathBuf,
    /// Frame file name suffix, e.g. "png" or ".bmp"
    pub image_format: String,
    /// Linear unit multiplier applied to exported coordinates
    pub scaling_factor: f64,
    /// Labels for the trailing folder path segments
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default = "default_tracker")]
    pub default_tracker: String,
    #[serde(default)]
    pub tracker: TrackerParams,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Config = crate::io::serialization::read_document(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_format.trim().is_empty() {
            bail!("image_format must not be empty");
        }
        if !self.scaling_factor.is_finite() {
            bail!("scaling_factor must be a finite number, got {}", self.scaling_factor);
        }
        if !(-1.0..=1.0).contains(&self.tracker.min_score) {
            bail!("tracker.min_score must lie in -1.0..=1.0");
        }
        Ok(())
    }

    /// Location of the exported table.
    pub fn results_path(&self) -> PathBuf {
        self.folder.join("results.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_json_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracking_config.json");
        std::fs::write(
            &path,
            r#"{"folder": "data", "image_format": "png", "scaling_factor": 0.1,
                "variables": ["subject", "position"]}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.folder, PathBuf::from("data"));
        assert_eq!(config.variables, vec!["subject", "position"]);
        assert_eq!(config.default_tracker, "MIL");
        assert_eq!(config.tracker, TrackerParams::default());
        assert_eq!(config.results_path(), PathBuf::from("data").join("results.csv"));
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracking.yaml");
        std::fs::write(
            &path,
            "folder: /data/us\nimage_format: .bmp\nscaling_factor: 2.0\ndefault_tracker: CSRT\ntracker:\n  search_radius: 8\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.image_format, ".bmp");
        assert!(config.variables.is_empty());
        assert_eq!(config.default_tracker, "CSRT");
        assert_eq!(config.tracker.search_radius, 8);
        assert_eq!(config.tracker.min_score, 0.5);
    }

    #[test]
    fn test_rejects_empty_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"folder": ".", "image_format": " ", "scaling_factor": 1.0}"#).unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(Config::load(&dir.path().join("nope.json")).is_err());
    }
}
