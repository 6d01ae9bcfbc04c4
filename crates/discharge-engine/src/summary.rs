//! Discharge Summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storage::CalculatedDischarge;

/// The most recent calculation in a summary window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryPoint {
    pub water_level: f64,
    pub discharge: f64,
    pub observed_at: DateTime<Utc>,
}

/// Aggregate view of a sensor's calculated discharges over a period.
///
/// Values are carried at full precision; [`rounded`](Self::rounded)
/// produces the presentation copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DischargeSummary {
    pub sensor_id: String,
    pub count: usize,
    /// Latest record by observation time
    pub latest: Option<SummaryPoint>,
    pub min_discharge: Option<f64>,
    pub max_discharge: Option<f64>,
    pub mean_discharge: Option<f64>,
}

impl DischargeSummary {
    pub fn from_records(sensor_id: &str, records: &[CalculatedDischarge]) -> Self {
        let latest = records
            .iter()
            .max_by_key(|r| r.observed_at)
            .map(|r| SummaryPoint {
                water_level: r.water_level,
                discharge: r.discharge,
                observed_at: r.observed_at,
            });

        let mut min = None;
        let mut max = None;
        let mut sum = 0.0;
        for r in records {
            min = Some(min.map_or(r.discharge, |m: f64| m.min(r.discharge)));
            max = Some(max.map_or(r.discharge, |m: f64| m.max(r.discharge)));
            sum += r.discharge;
        }

        Self {
            sensor_id: sensor_id.to_string(),
            count: records.len(),
            latest,
            min_discharge: min,
            max_discharge: max,
            mean_discharge: (!records.is_empty()).then(|| sum / records.len() as f64),
        }
    }

    /// Copy with every value rounded to `decimals` places, for display.
    pub fn rounded(&self, decimals: u32) -> Self {
        let round = |v: f64| round_to(v, decimals);
        Self {
            sensor_id: self.sensor_id.clone(),
            count: self.count,
            latest: self.latest.map(|p| SummaryPoint {
                water_level: round(p.water_level),
                discharge: round(p.discharge),
                observed_at: p.observed_at,
            }),
            min_discharge: self.min_discharge.map(round),
            max_discharge: self.max_discharge.map(round),
            mean_discharge: self.mean_discharge.map(round),
        }
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use storage::ReadingSource;

    fn record(discharge: f64, day: u32) -> CalculatedDischarge {
        CalculatedDischarge {
            id: 0,
            reading_id: day as i64,
            sensor_id: "AWLR-01".into(),
            source: ReadingSource::Actual,
            rating_curve_id: 1,
            water_level: discharge.sqrt(),
            discharge,
            observed_at: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            calculated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_summary() {
        let s = DischargeSummary::from_records("AWLR-01", &[]);
        assert_eq!(s.count, 0);
        assert!(s.latest.is_none());
        assert!(s.min_discharge.is_none());
        assert!(s.mean_discharge.is_none());
    }

    #[test]
    fn test_summary_statistics() {
        let records = vec![record(4.0, 2), record(9.0, 3), record(1.0, 1)];
        let s = DischargeSummary::from_records("AWLR-01", &records);

        assert_eq!(s.count, 3);
        assert_eq!(s.min_discharge, Some(1.0));
        assert_eq!(s.max_discharge, Some(9.0));
        assert_eq!(s.mean_discharge, Some(14.0 / 3.0));
        // Latest by observation time, not input order
        assert_eq!(s.latest.unwrap().discharge, 9.0);
    }

    #[test]
    fn test_rounding_is_presentation_only() {
        let records = vec![record(1.0, 1), record(2.0, 2)];
        let s = DischargeSummary::from_records("AWLR-01", &records);
        assert_eq!(s.mean_discharge, Some(1.5));

        let display = DischargeSummary::from_records("AWLR-01", &[record(14.0 / 3.0, 1)]);
        assert_eq!(display.rounded(2).min_discharge, Some(4.67));
        // The original stays untouched
        assert_eq!(display.min_discharge, Some(14.0 / 3.0));
    }
}
