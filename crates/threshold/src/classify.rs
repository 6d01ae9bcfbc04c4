//! Band Classification

use crate::level::{Severity, ThresholdLevel};
use crate::template::ThresholdTemplate;
use serde::{Deserialize, Serialize};

/// What to do with a value below the template's lowest band.
///
/// Legacy datasets sometimes start their lowest band above zero, so a
/// dry-season reading can fall under it. The default reports such
/// values as unclassified; `ClampToLowest` assigns them the lowest
/// band instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BelowRangePolicy {
    #[default]
    Unclassified,
    ClampToLowest,
}

/// Result of classifying one value against a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classification {
    /// The band whose `[min, max)` range contains the value
    Matched(ThresholdLevel),
    /// No band applies
    Unclassified,
}

impl Classification {
    pub fn level(&self) -> Option<&ThresholdLevel> {
        match self {
            Classification::Matched(level) => Some(level),
            Classification::Unclassified => None,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        self.level().map(|l| l.severity)
    }
}

/// Classify a value against a template's bands.
///
/// Bands are scanned in template order; callers should have run
/// [`ThresholdTemplate::validate`] when the template was stored. A
/// value below the lowest band follows `policy`; a value above a
/// finite top band, or a non-finite value, is `Unclassified`. Never
/// panics.
pub fn classify(
    template: &ThresholdTemplate,
    value: f64,
    policy: BelowRangePolicy,
) -> Classification {
    if !value.is_finite() {
        return Classification::Unclassified;
    }

    if let Some(level) = template.levels.iter().find(|l| l.contains(value)) {
        return Classification::Matched(level.clone());
    }

    let Some(lowest) = template.levels.first() else {
        return Classification::Unclassified;
    };

    if value < lowest.min_value {
        return match policy {
            BelowRangePolicy::Unclassified => Classification::Unclassified,
            BelowRangePolicy::ClampToLowest => Classification::Matched(lowest.clone()),
        };
    }

    // Above the finite top band
    Classification::Unclassified
}
