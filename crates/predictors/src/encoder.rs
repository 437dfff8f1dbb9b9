//! Closed-vocabulary label encoders.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tf_core::{holiday_label, CategoryCode, EncoderId, ForecastError, TripCodes, TripRequest};

use crate::InvalidArtifact;

/// On-disk shape of a fitted label encoder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncoderArtifact {
    pub classes: Vec<String>,
}

/// Maps category values to the integer codes assigned at training time.
/// A value's code is its position in the class list.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    id: EncoderId,
    classes: Vec<String>,
    index: HashMap<String, CategoryCode>,
}

impl LabelEncoder {
    pub fn from_classes(id: EncoderId, classes: Vec<String>) -> Result<Self, InvalidArtifact> {
        if classes.is_empty() {
            return Err(InvalidArtifact(format!("{id} encoder has no classes")));
        }
        let mut index = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if index.insert(class.clone(), code as CategoryCode).is_some() {
                return Err(InvalidArtifact(format!(
                    "{id} encoder lists class {class:?} more than once"
                )));
            }
        }
        Ok(Self { id, classes, index })
    }

    pub fn from_artifact(id: EncoderId, artifact: EncoderArtifact) -> Result<Self, InvalidArtifact> {
        Self::from_classes(id, artifact.classes)
    }

    pub fn id(&self) -> EncoderId {
        self.id
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }

    pub fn encode(&self, value: &str) -> Result<CategoryCode, ForecastError> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| ForecastError::UnknownCategory {
                encoder: self.id,
                value: value.to_string(),
            })
    }

    pub fn decode(&self, code: CategoryCode) -> Result<&str, ForecastError> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
            .ok_or(ForecastError::InvalidCode {
                encoder: self.id,
                code,
            })
    }
}

/// The four encoders a forecast needs, loaded together.
#[derive(Debug, Clone)]
pub struct EncoderSet {
    place: LabelEncoder,
    country: LabelEncoder,
    holiday: LabelEncoder,
    crowd_level: LabelEncoder,
}

impl EncoderSet {
    pub fn new(
        place: LabelEncoder,
        country: LabelEncoder,
        holiday: LabelEncoder,
        crowd_level: LabelEncoder,
    ) -> Result<Self, InvalidArtifact> {
        let set = Self {
            place,
            country,
            holiday,
            crowd_level,
        };
        for id in EncoderId::ALL {
            let actual = set.get(id).id();
            if actual != id {
                return Err(InvalidArtifact(format!(
                    "{actual} encoder supplied in the {id} slot"
                )));
            }
        }
        Ok(set)
    }

    pub fn get(&self, id: EncoderId) -> &LabelEncoder {
        match id {
            EncoderId::Place => &self.place,
            EncoderId::Country => &self.country,
            EncoderId::Holiday => &self.holiday,
            EncoderId::CrowdLevel => &self.crowd_level,
        }
    }

    pub fn encode(&self, id: EncoderId, value: &str) -> Result<CategoryCode, ForecastError> {
        self.get(id).encode(value)
    }

    pub fn decode(&self, id: EncoderId, code: CategoryCode) -> Result<&str, ForecastError> {
        self.get(id).decode(code)
    }

    pub fn vocabulary(&self, id: EncoderId) -> &[String] {
        self.get(id).classes()
    }

    /// Encode the trip-constant categories, failing on the first unknown value.
    pub fn encode_trip(&self, request: &TripRequest) -> Result<TripCodes, ForecastError> {
        Ok(TripCodes {
            place: self.place.encode(&request.place)?,
            country: self.country.encode(&request.country)?,
            holiday: self.holiday.encode(holiday_label(request.public_holiday))?,
        })
    }
}
