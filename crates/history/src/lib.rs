//! Read-only lookups over the historical visit dataset.
//!
//! The dataset is only used to pre-fill trip requests: which (place, country)
//! pairs exist, the usual public-holiday flag for a pair, and a typical past
//! crowd level. The forecast engine itself never reads it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use tf_core::{holiday_label, TripRequest};

pub const PLACE_COLUMN: &str = "Religious_Place";
pub const COUNTRY_COLUMN: &str = "Country";
pub const HOLIDAY_COLUMN: &str = "Public_Holiday";
pub const PAST_CROWD_COLUMN: &str = "Past_Crowd_Levels";

/// Days added to today for the default trip end.
pub const DEFAULT_TRIP_DAYS: i64 = 3;

#[derive(thiserror::Error, Debug)]
pub enum HistoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset is missing column {0:?}")]
    MissingColumn(&'static str),
    #[error("row {row}: {column} value {value:?} is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("no historical rows for {place:?} in {country:?}")]
    UnknownPair { place: String, country: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalRecord {
    pub place: String,
    pub country: String,
    pub public_holiday: Option<String>,
    pub past_crowd_level: f64,
}

#[derive(Debug, Clone, Default)]
pub struct HistoricalDataset {
    records: Vec<HistoricalRecord>,
}

/// Header cells are trimmed and inner spaces become underscores.
fn normalize_header(raw: &str) -> String {
    raw.trim().replace(' ', "_")
}

impl HistoricalDataset {
    pub fn from_records(records: Vec<HistoricalRecord>) -> Self {
        Self { records }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        let dataset = Self::from_reader(File::open(path)?)?;
        info!(path = %path.display(), rows = dataset.len(), "loaded historical dataset");
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, HistoryError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
        let column = |name: &'static str| headers.iter().position(|h| h == name);
        let place_idx = column(PLACE_COLUMN).ok_or(HistoryError::MissingColumn(PLACE_COLUMN))?;
        let country_idx =
            column(COUNTRY_COLUMN).ok_or(HistoryError::MissingColumn(COUNTRY_COLUMN))?;
        let crowd_idx =
            column(PAST_CROWD_COLUMN).ok_or(HistoryError::MissingColumn(PAST_CROWD_COLUMN))?;
        let holiday_idx = column(HOLIDAY_COLUMN);

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row?;
            let cell = |idx: usize| row.get(idx).unwrap_or("").to_string();
            let raw_crowd = cell(crowd_idx);
            let past_crowd_level =
                raw_crowd
                    .parse::<f64>()
                    .map_err(|_| HistoryError::InvalidNumber {
                        // header is line 1
                        row: i + 2,
                        column: PAST_CROWD_COLUMN,
                        value: raw_crowd.clone(),
                    })?;
            records.push(HistoricalRecord {
                place: cell(place_idx),
                country: cell(country_idx),
                public_holiday: holiday_idx.map(cell).filter(|v| !v.is_empty()),
                past_crowd_level,
            });
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    fn pair_rows<'a>(
        &'a self,
        place: &'a str,
        country: &'a str,
    ) -> impl Iterator<Item = &'a HistoricalRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.place == place && r.country == country)
    }

    /// Sorted, de-duplicated place names.
    pub fn places(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.place.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    /// Sorted countries recorded for a place.
    pub fn countries_for(&self, place: &str) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .records
            .iter()
            .filter(|r| r.place == place)
            .map(|r| r.country.as_str())
            .collect();
        set.into_iter().map(String::from).collect()
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        let set: BTreeSet<(&str, &str)> = self
            .records
            .iter()
            .map(|r| (r.place.as_str(), r.country.as_str()))
            .collect();
        set.into_iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    pub fn contains_pair(&self, place: &str, country: &str) -> bool {
        self.pair_rows(place, country).next().is_some()
    }

    /// Most common holiday value for the pair, smallest value winning a tie.
    /// `false` when the pair has no rows or no holiday values.
    pub fn default_public_holiday(&self, place: &str, country: &str) -> bool {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in self.pair_rows(place, country) {
            if let Some(value) = record.public_holiday.as_deref() {
                *counts.entry(value).or_default() += 1;
            }
        }
        let mut mode: Option<(&str, usize)> = None;
        for (value, count) in counts {
            if mode.map_or(true, |(_, best)| count > best) {
                mode = Some((value, count));
            }
        }
        mode.map_or(false, |(value, _)| value == holiday_label(true))
    }

    /// Truncated mean of the pair's past crowd levels, falling back to the
    /// truncated dataset median. `None` only for an empty dataset.
    pub fn default_past_crowd_level(&self, place: &str, country: &str) -> Option<i64> {
        let (sum, n) = self
            .pair_rows(place, country)
            .fold((0.0, 0usize), |(sum, n), r| (sum + r.past_crowd_level, n + 1));
        if n > 0 {
            return Some((sum / n as f64).trunc() as i64);
        }
        self.median_past_crowd().map(|m| m.trunc() as i64)
    }

    pub fn median_past_crowd(&self) -> Option<f64> {
        let mut values: Vec<f64> = self.records.iter().map(|r| r.past_crowd_level).collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        Some(if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        })
    }

    /// Observed `(min, max)` past crowd levels. Advisory only; requests
    /// outside this range are still forecast.
    pub fn past_crowd_bounds(&self) -> Option<(i64, i64)> {
        let mut values = self.records.iter().map(|r| r.past_crowd_level);
        let first = values.next()?;
        let (lo, hi) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some((lo.trunc() as i64, hi.trunc() as i64))
    }

    /// Build a request for a known pair using the dataset defaults.
    pub fn prefill(
        &self,
        place: &str,
        country: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TripRequest, HistoryError> {
        let unknown = || HistoryError::UnknownPair {
            place: place.to_string(),
            country: country.to_string(),
        };
        if !self.contains_pair(place, country) {
            return Err(unknown());
        }
        let past_crowd_level = self
            .default_past_crowd_level(place, country)
            .ok_or_else(unknown)?;
        Ok(TripRequest {
            place: place.to_string(),
            country: country.to_string(),
            public_holiday: self.default_public_holiday(place, country),
            past_crowd_level,
            start_date,
            end_date,
        })
    }
}

/// Default trip window: `today` through `today + DEFAULT_TRIP_DAYS`.
pub fn default_trip_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today, today + Duration::days(DEFAULT_TRIP_DAYS))
}
