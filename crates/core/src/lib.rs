//! Core types and errors for Tirtha Forecast.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type CategoryCode = i64;
pub type VisitorCount = u64;

/// Vocabulary string the holiday encoder was trained on for a holiday flag.
pub fn holiday_label(public_holiday: bool) -> &'static str {
    if public_holiday {
        "Yes"
    } else {
        "No"
    }
}

/// Identifies one of the four trained label encoders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EncoderId {
    Place,
    Country,
    Holiday,
    CrowdLevel,
}

impl EncoderId {
    pub const ALL: [EncoderId; 4] = [
        EncoderId::Place,
        EncoderId::Country,
        EncoderId::Holiday,
        EncoderId::CrowdLevel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EncoderId::Place => "place",
            EncoderId::Country => "country",
            EncoderId::Holiday => "holiday",
            EncoderId::CrowdLevel => "crowd_level",
        }
    }
}

impl fmt::Display for EncoderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripRequest {
    pub place: String,
    pub country: String,
    pub public_holiday: bool,
    /// Forwarded to the models as-is, even outside the historically observed range.
    pub past_crowd_level: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TripRequest {
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.start_date > self.end_date {
            return Err(ForecastError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Number of calendar days in `[start_date, end_date]`; zero for an inverted range.
    pub fn num_days(&self) -> usize {
        let span = (self.end_date - self.start_date).num_days();
        if span < 0 {
            0
        } else {
            span as usize + 1
        }
    }

    /// Every date of the trip, ascending, both ends inclusive.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date
            .iter_days()
            .take_while(move |date| *date <= end)
    }
}

/// Encoded categorical inputs that stay constant across a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripCodes {
    pub place: CategoryCode,
    pub country: CategoryCode,
    pub holiday: CategoryCode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub visitor_count: VisitorCount,
    pub crowd_level: CrowdLevel,
    pub advisory_tier: AdvisoryTier,
    pub recommendation: String,
}

/// Ordered per-day forecasts for a whole trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ForecastSequence {
    days: Vec<DailyForecast>,
}

impl ForecastSequence {
    pub fn new(days: Vec<DailyForecast>) -> Self {
        Self { days }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailyForecast> {
        self.days.iter()
    }

    pub fn days(&self) -> &[DailyForecast] {
        &self.days
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }

    pub fn total_visitors(&self) -> u64 {
        self.days
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.visitor_count))
    }

    /// The busiest day by predicted visitor count; earliest wins a tie.
    pub fn peak_day(&self) -> Option<&DailyForecast> {
        // max_by_key keeps the last maximum, so walk backwards.
        self.days.iter().rev().max_by_key(|d| d.visitor_count)
    }

    pub fn count_level(&self, level: CrowdLevel) -> usize {
        self.days.iter().filter(|d| d.crowd_level == level).count()
    }
}

impl IntoIterator for ForecastSequence {
    type Item = DailyForecast;
    type IntoIter = std::vec::IntoIter<DailyForecast>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.into_iter()
    }
}

impl<'a> IntoIterator for &'a ForecastSequence {
    type Item = &'a DailyForecast;
    type IntoIter = std::slice::Iter<'a, DailyForecast>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ForecastError {
    #[error("unknown {encoder} category {value:?}")]
    UnknownCategory { encoder: EncoderId, value: String },
    #[error("invalid {encoder} code {code}")]
    InvalidCode { encoder: EncoderId, code: CategoryCode },
    #[error("unknown crowd level label {0:?}")]
    UnknownLabel(String),
    #[error("failed to load artifact {path}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },
    #[error("trip start {start} is after trip end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("model inference failed: {0}")]
    Inference(String),
}

impl ForecastError {
    pub fn artifact_load(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        ForecastError::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the caller sent a request the engine cannot serve, as opposed
    /// to a model/encoder mismatch or a startup failure.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            ForecastError::UnknownCategory { .. } | ForecastError::InvalidDateRange { .. }
        )
    }
}

pub mod calendar;
pub mod crowd;

pub use calendar::{build_features, CalendarFeatures, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
pub use crowd::{AdvisoryTier, CrowdLevel};
