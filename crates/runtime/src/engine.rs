use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use tf_core::{ForecastError, ForecastSequence, TripRequest};
use tf_forecast::TripForecaster;
use tf_predictors::{DualModelPredictor, EncoderSet};

use crate::config::EngineConfig;
use crate::metrics::{MetricsRegistry, RequestTimer};
use crate::store::{load_artifacts, Artifacts};

static GLOBAL_ENGINE: OnceLock<Arc<Engine>> = OnceLock::new();

/// A loaded forecaster plus request metrics. Immutable after construction
/// and safe to share between threads.
#[derive(Clone)]
pub struct Engine {
    forecaster: TripForecaster,
    metrics: MetricsRegistry,
}

impl Engine {
    pub fn load(cfg: &EngineConfig) -> Result<Self, ForecastError> {
        info!(dir = %cfg.artifact_dir.display(), "loading forecast artifacts");
        Ok(Self::from_artifacts(load_artifacts(cfg)?))
    }

    pub fn from_artifacts(artifacts: Artifacts) -> Self {
        let predictor = DualModelPredictor::new(
            Arc::new(artifacts.regression),
            Arc::new(artifacts.classification),
        );
        Self::new(TripForecaster::new(
            Arc::new(predictor),
            Arc::new(artifacts.encoders),
        ))
    }

    pub fn new(forecaster: TripForecaster) -> Self {
        Self {
            forecaster,
            metrics: MetricsRegistry::default(),
        }
    }

    pub fn encoders(&self) -> &EncoderSet {
        self.forecaster.encoders()
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn forecast(&self, request: &TripRequest) -> Result<ForecastSequence, ForecastError> {
        let timer = RequestTimer::start();
        match self.forecaster.forecast(request) {
            Ok(sequence) => {
                let days = sequence.len() as u64;
                self.metrics.inc_requests_served(1);
                self.metrics.inc_days_forecast(days);
                self.metrics.record_trip_days(days);
                info!(
                    place = %request.place,
                    days,
                    elapsed_ms = timer.elapsed().as_millis() as u64,
                    "forecast served"
                );
                Ok(sequence)
            }
            Err(err) => {
                if err.is_request_error() {
                    self.metrics.inc_requests_rejected(1);
                    info!(error = %err, "forecast request rejected");
                } else {
                    self.metrics.inc_internal_failures(1);
                    warn!(error = %err, "forecast failed");
                }
                Err(err)
            }
        }
    }
}

/// Install the process-wide engine. Later calls keep the first engine.
pub fn install_global(engine: Engine) -> Arc<Engine> {
    let candidate = Arc::new(engine);
    match GLOBAL_ENGINE.set(Arc::clone(&candidate)) {
        Ok(()) => candidate,
        Err(_) => {
            warn!("global engine already installed; keeping the existing one");
            GLOBAL_ENGINE.get().cloned().unwrap_or(candidate)
        }
    }
}

/// Load artifacts once and install the result as the process-wide engine.
pub fn init_global(cfg: &EngineConfig) -> Result<Arc<Engine>, ForecastError> {
    if let Some(engine) = GLOBAL_ENGINE.get() {
        return Ok(Arc::clone(engine));
    }
    Ok(install_global(Engine::load(cfg)?))
}

pub fn global() -> Option<Arc<Engine>> {
    GLOBAL_ENGINE.get().cloned()
}
