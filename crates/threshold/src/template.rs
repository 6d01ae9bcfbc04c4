//! Threshold Templates

use crate::error::ThresholdError;
use crate::level::ThresholdLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which computed quantity a template's bands apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdParameter {
    WaterLevel,
    Discharge,
}

impl fmt::Display for ThresholdParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdParameter::WaterLevel => write!(f, "water_level"),
            ThresholdParameter::Discharge => write!(f, "discharge"),
        }
    }
}

/// A named set of severity bands for one parameter.
///
/// Templates are shared master data; sensors bind to one through an
/// assignment window. Band layout is only trustworthy after
/// [`validate`](ThresholdTemplate::validate) passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTemplate {
    pub id: i64,
    pub name: String,
    pub parameter: ThresholdParameter,
    /// Unit of the classified quantity, e.g. "m" or "m3/s"
    pub unit: String,
    /// Bands in ascending `level_order`
    pub levels: Vec<ThresholdLevel>,
    pub is_active: bool,
}

impl ThresholdTemplate {
    /// Check the band layout invariants: orders strictly ascending,
    /// each band non-empty, bands contiguous with no gaps or overlaps,
    /// and only the last band open-ended.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        if self.levels.is_empty() {
            return Err(ThresholdError::Empty(self.name.clone()));
        }

        let last = self.levels.len() - 1;
        for (i, level) in self.levels.iter().enumerate() {
            if i > 0 && level.level_order <= self.levels[i - 1].level_order {
                return Err(ThresholdError::UnorderedLevels(level.level_order));
            }
            match level.max_value {
                Some(max) if max <= level.min_value => {
                    return Err(ThresholdError::EmptyBand {
                        order: level.level_order,
                        min: level.min_value,
                        max,
                    });
                }
                None if i != last => {
                    return Err(ThresholdError::OpenEndedNotLast(level.level_order));
                }
                _ => {}
            }
        }

        for pair in self.levels.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.min_value < lower.min_value {
                return Err(ThresholdError::NonMonotonicMin {
                    order: upper.level_order,
                    min: upper.min_value,
                });
            }
            // Open-ended lower band already rejected above
            if let Some(max) = lower.max_value {
                if max != upper.min_value {
                    return Err(ThresholdError::NonContiguous {
                        order: lower.level_order,
                        max,
                        next_min: upper.min_value,
                    });
                }
            }
        }

        Ok(())
    }
}
