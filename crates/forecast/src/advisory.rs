use serde::Serialize;
use tf_core::{AdvisoryTier, CrowdLevel, ForecastError};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Advisory {
    pub tier: AdvisoryTier,
    pub recommendation: &'static str,
}

/// Advisory for an already-normalized crowd level.
pub fn advisory_for(level: CrowdLevel) -> Advisory {
    let recommendation = match level {
        CrowdLevel::Low => "Favorable conditions; suitable for visiting.",
        CrowdLevel::Medium => "Moderate crowding; plan timing accordingly.",
        CrowdLevel::High => "Heavy crowding; prefer early-morning or weekday visits.",
    };
    Advisory {
        tier: AdvisoryTier::from(level),
        recommendation,
    }
}

/// Classify a raw crowd-level label. Unrecognized labels are an error, never a default.
pub fn classify(label: &str) -> Result<Advisory, ForecastError> {
    CrowdLevel::parse_label(label).map(advisory_for)
}
