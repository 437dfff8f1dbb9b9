//! Tabular views and exports of a forecast sequence.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use tf_core::{CrowdLevel, DailyForecast, ForecastSequence};

pub const DEFAULT_EXPORT_FILE: &str = "trip_crowd_predictions.csv";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(thiserror::Error, Debug)]
pub enum ViewError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One row of the delimited export.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Visitor_Count")]
    visitor_count: u64,
    #[serde(rename = "Crowd_Level")]
    crowd_level: &'a str,
    #[serde(rename = "Indicator")]
    indicator: &'a str,
}

impl<'a> From<&'a DailyForecast> for ExportRow<'a> {
    fn from(day: &'a DailyForecast) -> Self {
        Self {
            date: day.date.format(DATE_FORMAT).to_string(),
            visitor_count: day.visitor_count,
            crowd_level: day.crowd_level.as_str(),
            indicator: day.advisory_tier.marker(),
        }
    }
}

/// Write `Date,Visitor_Count,Crowd_Level,Indicator` rows, header first.
pub fn write_csv<W: Write>(sequence: &ForecastSequence, writer: W) -> Result<(), ViewError> {
    let mut out = csv::Writer::from_writer(writer);
    if sequence.is_empty() {
        out.write_record(["Date", "Visitor_Count", "Crowd_Level", "Indicator"])?;
    }
    for day in sequence {
        out.serialize(ExportRow::from(day))?;
    }
    out.flush()?;
    Ok(())
}

pub fn to_csv_string(sequence: &ForecastSequence) -> Result<String, ViewError> {
    let mut buf = Vec::new();
    write_csv(sequence, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn export_csv(sequence: &ForecastSequence, path: impl AsRef<Path>) -> Result<(), ViewError> {
    write_csv(sequence, File::create(path)?)
}

pub fn to_json(sequence: &ForecastSequence) -> Result<String, ViewError> {
    Ok(serde_json::to_string_pretty(sequence)?)
}

/// Fixed-width text table: date, visitors, crowd level, tier.
pub fn render_table(sequence: &ForecastSequence) -> String {
    let mut out = format!(
        "{:<10}  {:>13}  {:<11}  {:<6}\n",
        "Date", "Visitor_Count", "Crowd_Level", "Tier"
    );
    for day in sequence {
        out.push_str(&format!(
            "{:<10}  {:>13}  {:<11}  {:<6}\n",
            day.date.format(DATE_FORMAT).to_string(),
            day.visitor_count,
            day.crowd_level,
            day.advisory_tier,
        ));
    }
    out
}

/// One advice line per day, e.g. `2024-01-06: 🔥 High crowd. Heavy crowding; ...`.
pub fn trip_tips(sequence: &ForecastSequence) -> Vec<String> {
    sequence
        .iter()
        .map(|day| {
            format!(
                "{}: {} {} crowd. {}",
                day.date.format(DATE_FORMAT),
                day.advisory_tier.marker(),
                day.crowd_level,
                day.recommendation
            )
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ForecastSummary {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub days: usize,
    pub total_visitors: u64,
    pub peak_date: Option<NaiveDate>,
    pub peak_visitors: u64,
    pub low_days: usize,
    pub medium_days: usize,
    pub high_days: usize,
}

pub fn summarize(sequence: &ForecastSequence) -> ForecastSummary {
    let peak = sequence.peak_day();
    ForecastSummary {
        start: sequence.first_date(),
        end: sequence.last_date(),
        days: sequence.len(),
        total_visitors: sequence.total_visitors(),
        peak_date: peak.map(|d| d.date),
        peak_visitors: peak.map_or(0, |d| d.visitor_count),
        low_days: sequence.count_level(CrowdLevel::Low),
        medium_days: sequence.count_level(CrowdLevel::Medium),
        high_days: sequence.count_level(CrowdLevel::High),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::AdvisoryTier;

    fn day(d: u32, visitors: u64, level: CrowdLevel, recommendation: &str) -> DailyForecast {
        DailyForecast {
            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            visitor_count: visitors,
            crowd_level: level,
            advisory_tier: AdvisoryTier::from(level),
            recommendation: recommendation.to_string(),
        }
    }

    fn sample() -> ForecastSequence {
        ForecastSequence::new(vec![
            day(5, 1200, CrowdLevel::Low, "Favorable conditions; suitable for visiting."),
            day(6, 8400, CrowdLevel::High, "Heavy crowding; prefer early-morning or weekday visits."),
            day(7, 4100, CrowdLevel::Medium, "Moderate crowding; plan timing accordingly."),
        ])
    }

    #[test]
    fn csv_layout() {
        let csv = to_csv_string(&sample()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Date,Visitor_Count,Crowd_Level,Indicator");
        assert_eq!(lines[1], "2024-01-05,1200,Low,✅");
        assert_eq!(lines[2], "2024-01-06,8400,High,🔥");
        assert_eq!(lines[3], "2024-01-07,4100,Medium,⚠️");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_sequence_still_has_header() {
        let csv = to_csv_string(&ForecastSequence::default()).unwrap();
        assert_eq!(csv.trim_end(), "Date,Visitor_Count,Crowd_Level,Indicator");
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_FILE);
        export_csv(&sample(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, to_csv_string(&sample()).unwrap());
    }

    #[test]
    fn table_has_row_per_day() {
        let table = render_table(&sample());
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Date"));
        assert!(lines[2].starts_with("2024-01-06"));
        assert!(lines[2].contains("8400"));
        assert!(lines[2].contains("High"));
    }

    #[test]
    fn tips_follow_levels() {
        let tips = trip_tips(&sample());
        assert_eq!(
            tips[1],
            "2024-01-06: 🔥 High crowd. Heavy crowding; prefer early-morning or weekday visits."
        );
        assert!(tips[0].starts_with("2024-01-05: ✅ Low crowd."));
    }

    #[test]
    fn summary_counts() {
        let s = summarize(&sample());
        assert_eq!(s.days, 3);
        assert_eq!(s.total_visitors, 13_700);
        assert_eq!(s.peak_date, NaiveDate::from_ymd_opt(2024, 1, 6));
        assert_eq!((s.low_days, s.medium_days, s.high_days), (1, 1, 1));

        let empty = summarize(&ForecastSequence::default());
        assert_eq!(empty.days, 0);
        assert_eq!(empty.peak_date, None);
    }

    #[test]
    fn json_is_an_array_of_days() {
        let json = to_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(3));
        assert_eq!(value[1]["crowd_level"], "High");
        assert_eq!(value[1]["visitor_count"], 8400);
    }
}
