//! Per-day calendar attributes and the model feature vector.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::TripCodes;

pub const FEATURE_COUNT: usize = 8;

/// Column order the models were trained with. Never reorder: a shuffled
/// vector still produces a plausible prediction, just a wrong one.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "past_crowd_level",
    "holiday",
    "day",
    "month",
    "weekday",
    "is_weekend",
    "place",
    "country",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarFeatures {
    pub day: u32,
    pub month: u32,
    /// Monday = 0 .. Sunday = 6.
    pub weekday_index: u32,
    pub is_weekend: bool,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        let weekday_index = date.weekday().num_days_from_monday();
        Self {
            day: date.day(),
            month: date.month(),
            weekday_index,
            is_weekend: weekday_index >= 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }
}

/// Build the feature vector for one day of a trip.
pub fn build_features(past_crowd_level: i64, codes: &TripCodes, date: NaiveDate) -> FeatureVector {
    let cal = CalendarFeatures::from_date(date);
    FeatureVector([
        past_crowd_level as f64,
        codes.holiday as f64,
        cal.day as f64,
        cal.month as f64,
        cal.weekday_index as f64,
        if cal.is_weekend { 1.0 } else { 0.0 },
        codes.place as f64,
        codes.country as f64,
    ])
}
