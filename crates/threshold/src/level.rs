//! Severity Bands

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity ladder for classified values, ordered from calm to critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Watch,
    Warning,
    Danger,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Normal => "normal",
            Severity::Watch => "watch",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
            Severity::Critical => "critical",
        };
        write!(f, "{}", label)
    }
}

/// One band of a threshold template.
///
/// A value belongs to the band when `min_value <= value` and either
/// `max_value` is unset or `value < max_value`. The open-ended band is
/// the template's top band and catches everything at or above its min.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLevel {
    /// Position in the template, ascending from the lowest band
    pub level_order: u32,
    /// Operator-facing band name, e.g. "Siaga 1"
    pub name: String,
    /// Inclusive lower bound
    pub min_value: f64,
    /// Exclusive upper bound; `None` marks the open-ended top band
    pub max_value: Option<f64>,
    pub severity: Severity,
    /// Whether crossing into this band should raise an alert
    pub alert_enabled: bool,
    /// Message template attached to the alert, if any
    pub alert_message: Option<String>,
}

impl ThresholdLevel {
    /// Band membership test, `[min_value, max_value)`.
    pub fn contains(&self, value: f64) -> bool {
        if value < self.min_value {
            return false;
        }
        match self.max_value {
            Some(max) => value < max,
            None => true,
        }
    }
}
