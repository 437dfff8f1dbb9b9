//! Startup loading of trained artifacts.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use tf_core::{CrowdLevel, EncoderId, ForecastError};
use tf_predictors::{EncoderArtifact, EncoderSet, LabelEncoder, ModelArtifact};

use crate::config::EngineConfig;

/// Everything the engine needs, loaded and validated.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub regression: ModelArtifact,
    pub classification: ModelArtifact,
    pub encoders: EncoderSet,
}

fn read_text(path: &Path) -> Result<String, ForecastError> {
    fs::read_to_string(path).map_err(|e| ForecastError::artifact_load(path, e))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ForecastError> {
    serde_json::from_str(&read_text(path)?).map_err(|e| ForecastError::artifact_load(path, e))
}

fn load_model(path: &Path) -> Result<ModelArtifact, ForecastError> {
    let model = ModelArtifact::from_json(&read_text(path)?)
        .map_err(|e| ForecastError::artifact_load(path, e))?;
    info!(path = %path.display(), model = %model.describe(), "loaded model");
    Ok(model)
}

fn load_encoder(path: &Path, id: EncoderId) -> Result<LabelEncoder, ForecastError> {
    let artifact: EncoderArtifact = read_json(path)?;
    let encoder =
        LabelEncoder::from_artifact(id, artifact).map_err(|e| ForecastError::artifact_load(path, e))?;
    info!(path = %path.display(), encoder = %id, classes = encoder.classes().len(), "loaded encoder");
    Ok(encoder)
}

/// Load both models and all four encoders. Any failure is fatal for startup.
pub fn load_artifacts(cfg: &EngineConfig) -> Result<Artifacts, ForecastError> {
    let files = &cfg.files;
    let regression = load_model(&cfg.path_of(&files.regression))?;
    let classification = load_model(&cfg.path_of(&files.classification))?;

    let crowd_path = cfg.path_of(&files.crowd_encoder);
    let crowd = load_encoder(&crowd_path, EncoderId::CrowdLevel)?;
    for class in crowd.classes() {
        if CrowdLevel::parse_label(class).is_err() {
            warn!(class = %class, "crowd encoder class is not a known crowd level");
        }
    }

    let encoders = EncoderSet::new(
        load_encoder(&cfg.path_of(&files.place_encoder), EncoderId::Place)?,
        load_encoder(&cfg.path_of(&files.country_encoder), EncoderId::Country)?,
        load_encoder(&cfg.path_of(&files.holiday_encoder), EncoderId::Holiday)?,
        crowd,
    )
    .map_err(|e| ForecastError::artifact_load(&cfg.artifact_dir, e))?;

    Ok(Artifacts {
        regression,
        classification,
        encoders,
    })
}
