use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File names inside the artifact directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ArtifactFiles {
    pub regression: String,
    pub classification: String,
    pub place_encoder: String,
    pub country_encoder: String,
    pub holiday_encoder: String,
    pub crowd_encoder: String,
}

impl Default for ArtifactFiles {
    fn default() -> Self {
        Self {
            regression: "regression_model.json".to_string(),
            classification: "classification_model.json".to_string(),
            place_encoder: "label_encoder_place.json".to_string(),
            country_encoder: "label_encoder_country.json".to_string(),
            holiday_encoder: "label_encoder_holiday.json".to_string(),
            crowd_encoder: "label_encoder_crowd.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub artifact_dir: PathBuf,
    pub files: ArtifactFiles,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifacts"),
            files: ArtifactFiles::default(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing engine config {}", path.display()))
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        self.artifact_dir.join(file)
    }
}
