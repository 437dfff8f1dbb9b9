use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ForecastError;

/// Crowd level decoded from the classification model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CrowdLevel {
    Low,
    Medium,
    High,
}

impl CrowdLevel {
    pub const ALL: [CrowdLevel; 3] = [CrowdLevel::Low, CrowdLevel::Medium, CrowdLevel::High];

    /// Normalize a decoded label, ignoring ASCII case and surrounding whitespace.
    pub fn parse_label(label: &str) -> Result<Self, ForecastError> {
        let trimmed = label.trim();
        CrowdLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ForecastError::UnknownLabel(label.to_string()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CrowdLevel::Low => "Low",
            CrowdLevel::Medium => "Medium",
            CrowdLevel::High => "High",
        }
    }
}

impl FromStr for CrowdLevel {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrowdLevel::parse_label(s)
    }
}

impl fmt::Display for CrowdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Presentation-facing severity, one tier per crowd level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdvisoryTier {
    Low,
    Medium,
    High,
}

impl AdvisoryTier {
    pub fn as_str(self) -> &'static str {
        match self {
            AdvisoryTier::Low => "Low",
            AdvisoryTier::Medium => "Medium",
            AdvisoryTier::High => "High",
        }
    }

    /// Marker shown in the exported `Indicator` column.
    pub fn marker(self) -> &'static str {
        match self {
            AdvisoryTier::Low => "✅",
            AdvisoryTier::Medium => "⚠️",
            AdvisoryTier::High => "🔥",
        }
    }
}

impl From<CrowdLevel> for AdvisoryTier {
    fn from(level: CrowdLevel) -> Self {
        match level {
            CrowdLevel::Low => AdvisoryTier::Low,
            CrowdLevel::Medium => AdvisoryTier::Medium,
            CrowdLevel::High => AdvisoryTier::High,
        }
    }
}

impl fmt::Display for AdvisoryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
