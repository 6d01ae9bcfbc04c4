//! Rating Curve Record

use crate::error::DomainError;
use crate::formula::{self, FormulaKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stage-discharge rating curve for one sensor, valid over an
/// effective date window.
///
/// Windows are half-open: the curve applies from `effective_from`
/// (inclusive) up to `effective_to` (exclusive). `effective_to = None`
/// means open-ended. Several curves may exist per sensor to capture
/// re-calibration history; among `is_active` curves at most one window
/// should cover any instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCurve {
    pub id: i64,
    /// Sensor the curve belongs to
    pub sensor_id: String,
    /// Formula family the parameters plug into
    pub kind: FormulaKind,
    /// Coefficient C
    pub coefficient: f64,
    /// Exponent B (width factor for `Weir`)
    pub exponent: f64,
    /// Datum offset A (unused by `Weir`)
    pub offset: f64,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl RatingCurve {
    /// Whether `at` falls inside the curve's effective window.
    pub fn window_contains(&self, at: DateTime<Utc>) -> bool {
        if at < self.effective_from {
            return false;
        }
        match self.effective_to {
            None => true,
            Some(to) => at < to,
        }
    }

    /// Evaluate the curve at a water level, full f64 precision.
    pub fn discharge(&self, water_level: f64) -> Result<f64, DomainError> {
        formula::compute_discharge(water_level, self)
    }
}

impl Default for RatingCurve {
    fn default() -> Self {
        Self {
            id: 0,
            sensor_id: String::new(),
            kind: FormulaKind::Power,
            coefficient: 1.0,
            exponent: 1.0,
            offset: 0.0,
            effective_from: Utc::now(),
            effective_to: None,
            is_active: true,
        }
    }
}

/// Renders the curve's formula with its parameters substituted,
/// e.g. `Q = 1.2 * (H - 0.3)^1.5`. Used in calculation logs.
impl fmt::Display for RatingCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FormulaKind::Power => {
                write!(
                    f,
                    "Q = {} * (H - {})^{}",
                    self.coefficient, self.offset, self.exponent
                )
            }
            FormulaKind::Weir => {
                write!(
                    f,
                    "Q = {} * {} * H^(3/2)",
                    self.coefficient, self.exponent
                )
            }
            FormulaKind::ShiftedPower => {
                write!(
                    f,
                    "Q = {} * (H + {})^{}",
                    self.coefficient, self.offset, self.exponent
                )
            }
        }
    }
}
