//! Trip forecasting and crowd advisories.

pub mod advisory;
pub mod forecaster;

pub use advisory::{advisory_for, classify, Advisory};
pub use forecaster::TripForecaster;
