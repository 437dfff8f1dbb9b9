use std::sync::Arc;

use chrono::NaiveDate;
use tracing::trace;

use tf_core::{
    build_features, CrowdLevel, DailyForecast, EncoderId, ForecastError, ForecastSequence,
    TripCodes, TripRequest,
};
use tf_predictors::{CrowdPredictor, EncoderSet};

use crate::advisory::advisory_for;

/// Turns trip requests into per-day forecasts using shared, read-only
/// models and encoders.
#[derive(Clone)]
pub struct TripForecaster {
    predictor: Arc<dyn CrowdPredictor>,
    encoders: Arc<EncoderSet>,
}

impl TripForecaster {
    pub fn new(predictor: Arc<dyn CrowdPredictor>, encoders: Arc<EncoderSet>) -> Self {
        Self {
            predictor,
            encoders,
        }
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    /// Forecast every day of the trip, earliest first.
    ///
    /// Categories are encoded before any inference runs, so an unknown place,
    /// country or holiday value rejects the whole request. Any later failure
    /// also discards the days already computed.
    pub fn forecast(&self, request: &TripRequest) -> Result<ForecastSequence, ForecastError> {
        request.validate()?;
        let codes = self.encoders.encode_trip(request)?;

        let mut days = Vec::with_capacity(request.num_days());
        for date in request.dates() {
            days.push(self.forecast_day(request.past_crowd_level, &codes, date)?);
        }

        Ok(ForecastSequence::new(days))
    }

    fn forecast_day(
        &self,
        past_crowd_level: i64,
        codes: &TripCodes,
        date: NaiveDate,
    ) -> Result<DailyForecast, ForecastError> {
        let features = build_features(past_crowd_level, codes, date);
        let prediction = self.predictor.predict(&features)?;
        let label = self
            .encoders
            .decode(EncoderId::CrowdLevel, prediction.crowd_code)?;
        let crowd_level = CrowdLevel::parse_label(label)?;
        let advisory = advisory_for(crowd_level);

        trace!(
            %date,
            estimate = prediction.visitor_estimate,
            code = prediction.crowd_code,
            level = %crowd_level,
            "day evaluated"
        );
        Ok(DailyForecast {
            date,
            visitor_count: prediction.visitor_count()?,
            crowd_level,
            advisory_tier: advisory.tier,
            recommendation: advisory.recommendation.to_string(),
        })
    }
}
