//! Derived Record Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a water-level reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    /// Telemetry observed by the station
    Actual,
    /// Forecast value from a prediction model
    Predicted,
}

impl fmt::Display for ReadingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingSource::Actual => write!(f, "actual"),
            ReadingSource::Predicted => write!(f, "predicted"),
        }
    }
}

/// A discharge value derived from one reading.
///
/// Owned by the reading: deleted with it and replaced whenever the
/// reading's value changes. `discharge` keeps full f64 precision;
/// rounding happens only at presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedDischarge {
    pub id: i64,
    pub reading_id: i64,
    pub sensor_id: String,
    pub source: ReadingSource,
    /// Curve the value was computed with, for audit
    pub rating_curve_id: i64,
    /// Water level the curve was applied to (m)
    pub water_level: f64,
    /// Computed discharge (m3/s)
    pub discharge: f64,
    /// When the water level was observed
    pub observed_at: DateTime<Utc>,
    /// When the engine computed this record
    pub calculated_at: DateTime<Utc>,
}

/// Binds a sensor to a threshold template over an effective window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAssignment {
    pub sensor_id: String,
    pub template_id: i64,
    pub effective_from: DateTime<Utc>,
    /// `None` keeps the assignment open-ended
    pub effective_to: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl ThresholdAssignment {
    /// Half-open window test, `effective_from <= t < effective_to`.
    pub fn window_contains(&self, t: DateTime<Utc>) -> bool {
        if t < self.effective_from {
            return false;
        }
        match self.effective_to {
            Some(end) => t < end,
            None => true,
        }
    }
}
