//! Encoders, model traits and the dual-model predictor.

use std::sync::Arc;

use tf_core::{CategoryCode, FeatureVector, ForecastError, VisitorCount};

pub mod encoder;
pub mod model;

pub use encoder::{EncoderArtifact, EncoderSet, LabelEncoder};
pub use model::{DecisionTree, LinearModel, ModelArtifact, TreeEnsemble, TreeNode};

/// A trained artifact that failed structural checks.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid artifact: {0}")]
pub struct InvalidArtifact(pub String);

/// Continuous visitor-count model.
pub trait Regressor: Send + Sync {
    fn predict_value(&self, features: &FeatureVector) -> Result<f64, ForecastError>;
}

/// Discrete crowd-level model; returns a crowd-level encoder code.
pub trait Classifier: Send + Sync {
    fn predict_class(&self, features: &FeatureVector) -> Result<CategoryCode, ForecastError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub visitor_estimate: f64,
    pub crowd_code: CategoryCode,
}

impl Prediction {
    pub fn visitor_count(&self) -> Result<VisitorCount, ForecastError> {
        surface_visitor_count(self.visitor_estimate)
    }
}

/// Truncate a raw estimate toward zero; negative estimates become 0.
/// Large estimates are not capped. A non-finite estimate is an inference failure.
pub fn surface_visitor_count(estimate: f64) -> Result<VisitorCount, ForecastError> {
    if !estimate.is_finite() {
        return Err(ForecastError::Inference(format!(
            "non-finite visitor estimate {estimate}"
        )));
    }
    Ok(estimate.max(0.0).trunc() as VisitorCount)
}

/// Anything that turns one day's features into a visitor estimate and a crowd code.
pub trait CrowdPredictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ForecastError>;
}

/// Runs the regression and classification models independently on the same
/// vector. The two outputs are not reconciled and may disagree.
#[derive(Clone)]
pub struct DualModelPredictor {
    regressor: Arc<dyn Regressor>,
    classifier: Arc<dyn Classifier>,
}

impl DualModelPredictor {
    pub fn new(regressor: Arc<dyn Regressor>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            regressor,
            classifier,
        }
    }
}

impl CrowdPredictor for DualModelPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ForecastError> {
        let visitor_estimate = self.regressor.predict_value(features)?;
        if !visitor_estimate.is_finite() {
            return Err(ForecastError::Inference(format!(
                "non-finite visitor estimate {visitor_estimate}"
            )));
        }
        Ok(Prediction {
            visitor_estimate,
            crowd_code: self.classifier.predict_class(features)?,
        })
    }
}
