//! Discharge Calculation Engine

use crate::config::EngineConfig;
use crate::locks::LockPool;
use crate::outcome::{BatchOutcome, Calculation, EngineError, ProcessOutcome, RecalculationOutcome};
use crate::reading::{ReadingEvent, SensorReading};
use crate::summary::DischargeSummary;
use chrono::{DateTime, Utc};
use rating_curve::compute_discharge;
use std::sync::Arc;
use storage::{CalculatedDischarge, CurveStore, DischargeStore, ReadingSource, ThresholdStore};
use threshold::{classify, Classification, ThresholdParameter};
use tracing::{debug, error, info, warn};

/// Orchestrates discharge calculation for reading lifecycle events.
///
/// Per reading the flow is: value present? -> select the rating curve
/// effective at the observation time -> compute discharge -> persist
/// the derived record -> classify it against the sensor's threshold
/// template. A reading without an applicable curve is a terminal
/// no-op, logged at warn.
///
/// The engine holds its collaborators behind trait objects, so hosts
/// inject whatever store implementations they run against.
pub struct DischargeEngine {
    curves: Arc<dyn CurveStore>,
    discharges: Arc<dyn DischargeStore>,
    thresholds: Arc<dyn ThresholdStore>,
    config: EngineConfig,
    locks: LockPool,
}

impl DischargeEngine {
    pub fn new(
        curves: Arc<dyn CurveStore>,
        discharges: Arc<dyn DischargeStore>,
        thresholds: Arc<dyn ThresholdStore>,
    ) -> Self {
        Self::with_config(curves, discharges, thresholds, EngineConfig::default())
    }

    pub fn with_config(
        curves: Arc<dyn CurveStore>,
        discharges: Arc<dyn DischargeStore>,
        thresholds: Arc<dyn ThresholdStore>,
        config: EngineConfig,
    ) -> Self {
        info!(
            "Creating discharge engine with {} lock stripes",
            config.lock_stripes
        );
        Self {
            curves,
            discharges,
            thresholds,
            locks: LockPool::new(config.lock_stripes),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Dispatch one lifecycle event to the matching handler.
    pub fn handle(&self, event: &ReadingEvent) -> ProcessOutcome {
        match event {
            ReadingEvent::Created(reading) => self.on_created(reading),
            ReadingEvent::Updated {
                reading,
                previous_value,
            } => self.on_updated(reading, *previous_value),
            ReadingEvent::Deleted { reading_id } => ProcessOutcome::Removed {
                rows: self.on_deleted(*reading_id),
            },
        }
    }

    /// A reading was stored; derive its discharge.
    pub fn on_created(&self, reading: &SensorReading) -> ProcessOutcome {
        debug!(
            "Reading {} created for sensor {}, triggering discharge calculation",
            reading.id, reading.sensor_id
        );
        self.process_reading(reading)
    }

    /// A reading was rewritten. Only a change of the water level
    /// matters: an unchanged value is a no-op, anything else drops the
    /// previously derived records and re-runs the created path.
    pub fn on_updated(
        &self,
        reading: &SensorReading,
        previous_value: Option<f64>,
    ) -> ProcessOutcome {
        if reading.value == previous_value {
            debug!(
                "Reading {} update did not change the water level, skipping",
                reading.id
            );
            return ProcessOutcome::Unchanged;
        }

        info!(
            "Water level changed for reading {}, recalculating discharge",
            reading.id
        );
        let _stripe = self.locks.lock(reading.id);
        if let Err(e) = self.discharges.delete_for_reading(reading.id) {
            return self.fail(reading.id, e.into());
        }
        self.process_locked(reading)
    }

    /// A reading was removed; cascade to its derived records. Returns
    /// how many were dropped.
    pub fn on_deleted(&self, reading_id: i64) -> usize {
        let _stripe = self.locks.lock(reading_id);
        match self.discharges.delete_for_reading(reading_id) {
            Ok(removed) => {
                if removed > 0 {
                    info!(
                        "Deleted {} calculated discharge(s) for reading {}",
                        removed, reading_id
                    );
                }
                removed
            }
            Err(e) => {
                error!(
                    "Error deleting calculated discharges for reading {}: {}",
                    reading_id, e
                );
                0
            }
        }
    }

    /// Run the created path for one reading. Serialized per reading
    /// id; failures are absorbed into the outcome and never propagate
    /// to the caller that stored the reading.
    pub fn process_reading(&self, reading: &SensorReading) -> ProcessOutcome {
        let _stripe = self.locks.lock(reading.id);
        self.process_locked(reading)
    }

    /// Process every reading in order, counting stored calculations
    /// against everything else.
    pub fn process_batch(&self, readings: &[SensorReading]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for reading in readings {
            if self.process_reading(reading).is_calculated() {
                outcome.succeeded += 1;
            } else {
                outcome.failed += 1;
            }
        }
        info!(
            "Batch discharge calculation completed: {} total, {} succeeded, {} failed",
            readings.len(),
            outcome.succeeded,
            outcome.failed
        );
        outcome
    }

    /// Drop the stored discharges for a sensor in `[from, to)` and
    /// reprocess the supplied readings, typically after a curve edit.
    /// Readings outside the window or for another sensor are ignored;
    /// reading storage is the host's, so the host replays them.
    pub fn recalculate_range(
        &self,
        sensor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        readings: &[SensorReading],
    ) -> Result<RecalculationOutcome, EngineError> {
        info!(
            "Recalculating discharges for sensor {} between {} and {}",
            sensor_id, from, to
        );
        let deleted = self
            .discharges
            .delete_for_sensor_between(sensor_id, from, to, None)?;

        let mut outcome = RecalculationOutcome {
            deleted,
            ..Default::default()
        };
        for reading in readings {
            if reading.sensor_id != sensor_id
                || reading.observed_at < from
                || reading.observed_at >= to
            {
                continue;
            }
            if self.process_reading(reading).is_calculated() {
                outcome.succeeded += 1;
            } else {
                outcome.failed += 1;
            }
        }

        info!(
            "Recalculation for sensor {} finished: {} deleted, {} succeeded, {} failed",
            sensor_id, outcome.deleted, outcome.succeeded, outcome.failed
        );
        Ok(outcome)
    }

    /// Aggregate the stored calculations for a sensor over `[from, to)`.
    pub fn summary_for(
        &self,
        sensor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        source: Option<ReadingSource>,
    ) -> Result<DischargeSummary, EngineError> {
        let records = self
            .discharges
            .for_sensor_between(sensor_id, from, to, source)?;
        Ok(DischargeSummary::from_records(sensor_id, &records))
    }

    fn process_locked(&self, reading: &SensorReading) -> ProcessOutcome {
        let Some(water_level) = reading.value else {
            debug!("Reading {} has no water level, skipping", reading.id);
            return ProcessOutcome::NoValue;
        };

        let curve = match self
            .curves
            .curve_for(&reading.sensor_id, reading.observed_at)
        {
            Ok(Some(curve)) => curve,
            Ok(None) => {
                warn!(
                    "No active rating curve found for sensor {} at {}",
                    reading.sensor_id, reading.observed_at
                );
                return ProcessOutcome::NoCurve;
            }
            Err(e) => return self.fail(reading.id, e.into()),
        };

        let discharge = match compute_discharge(water_level, &curve) {
            Ok(q) => q,
            Err(e) => return self.fail(reading.id, e.into()),
        };

        let mut record = CalculatedDischarge {
            id: 0,
            reading_id: reading.id,
            sensor_id: reading.sensor_id.clone(),
            source: reading.source,
            rating_curve_id: curve.id,
            water_level,
            discharge,
            observed_at: reading.observed_at,
            calculated_at: Utc::now(),
        };
        record.id = match self.discharges.insert(record.clone()) {
            Ok(id) => id,
            Err(e) => return self.fail(reading.id, e.into()),
        };

        let classification = self.classify_record(&record);
        let dp = self.config.display_decimals as usize;
        info!(
            "Discharge calculated for sensor {}: water level {:.dp$} -> discharge {:.dp$} using curve {} [{}]",
            reading.sensor_id, water_level, discharge, curve.id, curve, dp = dp
        );

        ProcessOutcome::Calculated(Calculation {
            discharge: record,
            classification,
        })
    }

    /// Classification is best effort: the discharge record is already
    /// stored, so a failed template lookup downgrades to Unclassified
    /// instead of voiding the calculation.
    fn classify_record(&self, record: &CalculatedDischarge) -> Classification {
        let template = match self
            .thresholds
            .template_for_sensor(&record.sensor_id, record.observed_at)
        {
            Ok(Some(template)) => template,
            Ok(None) => {
                debug!("No threshold template assigned to sensor {}", record.sensor_id);
                return Classification::Unclassified;
            }
            Err(e) => {
                error!(
                    "Threshold lookup failed for sensor {}: {}",
                    record.sensor_id, e
                );
                return Classification::Unclassified;
            }
        };

        let value = match template.parameter {
            ThresholdParameter::WaterLevel => record.water_level,
            ThresholdParameter::Discharge => record.discharge,
        };
        let classification = classify(&template, value, self.config.below_range_policy);

        if let Some(level) = classification.level() {
            if level.alert_enabled {
                let message = level.alert_message.as_deref().unwrap_or(&level.name);
                warn!(
                    "Threshold '{}' ({}) reached for sensor {} with {} {}: {}",
                    level.name, level.severity, record.sensor_id, template.parameter, value, message
                );
            }
        }
        classification
    }

    fn fail(&self, reading_id: i64, error: EngineError) -> ProcessOutcome {
        error!(
            "Error calculating discharge for reading {}: {}",
            reading_id, error
        );
        ProcessOutcome::Failed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rating_curve::RatingCurve;
    use storage::{MemoryStore, ThresholdAssignment};
    use threshold::{BelowRangePolicy, Severity, ThresholdLevel, ThresholdTemplate};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, DischargeEngine) {
        let store = Arc::new(MemoryStore::new());
        let engine = DischargeEngine::new(store.clone(), store.clone(), store.clone());
        (store, engine)
    }

    // Q = H^2 from 2024-01-01, open-ended
    fn seed_square_curve(store: &MemoryStore) -> i64 {
        store
            .insert_curve(RatingCurve {
                sensor_id: "AWLR-01".into(),
                coefficient: 1.0,
                exponent: 2.0,
                offset: 0.0,
                effective_from: at(2024, 1, 1),
                effective_to: None,
                ..Default::default()
            })
            .unwrap()
    }

    fn reading_at(id: i64, value: Option<f64>, observed_at: DateTime<Utc>) -> SensorReading {
        SensorReading {
            id,
            sensor_id: "AWLR-01".into(),
            value,
            observed_at,
            source: ReadingSource::Actual,
        }
    }

    fn reading(id: i64, value: Option<f64>) -> SensorReading {
        reading_at(id, value, at(2024, 3, 1))
    }

    fn level(
        order: u32,
        min: f64,
        max: Option<f64>,
        severity: Severity,
        alert: bool,
    ) -> ThresholdLevel {
        ThresholdLevel {
            level_order: order,
            name: format!("band-{}", order),
            min_value: min,
            max_value: max,
            severity,
            alert_enabled: alert,
            alert_message: alert.then(|| "water rising".to_string()),
        }
    }

    fn assign_bands(
        store: &MemoryStore,
        parameter: ThresholdParameter,
        levels: Vec<ThresholdLevel>,
    ) {
        let template_id = store
            .insert_template(ThresholdTemplate {
                id: 0,
                name: "bands".into(),
                parameter,
                unit: "m".into(),
                levels,
                is_active: true,
            })
            .unwrap();
        store
            .assign_template(ThresholdAssignment {
                sensor_id: "AWLR-01".into(),
                template_id,
                effective_from: at(2024, 1, 1),
                effective_to: None,
                is_active: true,
            })
            .unwrap();
    }

    fn severity_of(outcome: &ProcessOutcome) -> Option<Severity> {
        match outcome {
            ProcessOutcome::Calculated(c) => c.classification.severity(),
            _ => None,
        }
    }

    #[test]
    fn test_created_reading_is_calculated() {
        let (store, engine) = setup();
        let curve_id = seed_square_curve(&store);

        let outcome = engine.on_created(&reading(1, Some(2.5)));

        match outcome {
            ProcessOutcome::Calculated(calc) => {
                assert_eq!(calc.discharge.discharge, 6.25);
                assert_eq!(calc.discharge.rating_curve_id, curve_id);
                assert_eq!(calc.classification, Classification::Unclassified);
            }
            other => panic!("expected Calculated, got {:?}", other),
        }

        let rows = store.for_reading(1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].water_level, 2.5);
        assert_eq!(rows[0].discharge, 6.25);
    }

    #[test]
    fn test_missing_curve_is_terminal_no_curve() {
        let (store, engine) = setup();
        let outcome = engine.on_created(&reading(1, Some(2.5)));
        assert!(matches!(outcome, ProcessOutcome::NoCurve));
        assert_eq!(store.discharge_count(), 0);
    }

    #[test]
    fn test_missing_value_skips_calculation() {
        let (store, engine) = setup();
        seed_square_curve(&store);
        let outcome = engine.on_created(&reading(1, None));
        assert!(matches!(outcome, ProcessOutcome::NoValue));
        assert_eq!(store.discharge_count(), 0);
    }

    #[test]
    fn test_domain_error_is_absorbed() {
        let (store, engine) = setup();
        store
            .insert_curve(RatingCurve {
                sensor_id: "AWLR-01".into(),
                coefficient: 1.0,
                exponent: 1.5,
                offset: 0.5,
                effective_from: at(2024, 1, 1),
                effective_to: None,
                ..Default::default()
            })
            .unwrap();

        // Water level below the datum offset
        let outcome = engine.on_created(&reading(1, Some(0.1)));
        assert!(matches!(
            outcome,
            ProcessOutcome::Failed(EngineError::Domain(_))
        ));
        assert_eq!(store.discharge_count(), 0);
    }

    #[test]
    fn test_update_with_unchanged_value_is_noop() {
        let (store, engine) = setup();
        seed_square_curve(&store);
        engine.on_created(&reading(1, Some(2.5)));

        let outcome = engine.on_updated(&reading(1, Some(2.5)), Some(2.5));
        assert!(matches!(outcome, ProcessOutcome::Unchanged));
        assert_eq!(store.discharge_count(), 1);
    }

    #[test]
    fn test_update_replaces_previous_calculation() {
        let (store, engine) = setup();
        seed_square_curve(&store);
        engine.on_created(&reading(1, Some(2.0)));

        let outcome = engine.on_updated(&reading(1, Some(3.0)), Some(2.0));
        assert!(outcome.is_calculated());

        let rows = store.for_reading(1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].discharge, 9.0);
    }

    #[test]
    fn test_update_clearing_value_drops_derived_rows() {
        let (store, engine) = setup();
        seed_square_curve(&store);
        engine.on_created(&reading(1, Some(2.0)));

        let outcome = engine.on_updated(&reading(1, None), Some(2.0));
        assert!(matches!(outcome, ProcessOutcome::NoValue));
        assert_eq!(store.discharge_count(), 0);
    }

    #[test]
    fn test_delete_cascades_to_derived_rows() {
        let (store, engine) = setup();
        seed_square_curve(&store);
        engine.on_created(&reading(1, Some(2.0)));

        assert_eq!(engine.on_deleted(1), 1);
        assert_eq!(store.discharge_count(), 0);
        assert_eq!(engine.on_deleted(1), 0);
    }

    #[test]
    fn test_handle_dispatches_events() {
        let (store, engine) = setup();
        seed_square_curve(&store);

        let created = engine.handle(&ReadingEvent::Created(reading(1, Some(2.0))));
        assert!(created.is_calculated());

        let updated = engine.handle(&ReadingEvent::Updated {
            reading: reading(1, Some(2.0)),
            previous_value: Some(2.0),
        });
        assert!(matches!(updated, ProcessOutcome::Unchanged));

        let deleted = engine.handle(&ReadingEvent::Deleted { reading_id: 1 });
        assert!(matches!(deleted, ProcessOutcome::Removed { rows: 1 }));
    }

    #[test]
    fn test_batch_counts_anything_short_of_calculated_as_failed() {
        let (store, engine) = setup();
        seed_square_curve(&store);

        let mut stray = reading_at(3, Some(1.0), at(2024, 3, 3));
        stray.sensor_id = "AWLR-99".into();
        let readings = vec![reading(1, Some(2.5)), reading(2, None), stray];

        let outcome = engine.process_batch(&readings);
        assert_eq!(outcome, BatchOutcome { succeeded: 1, failed: 2 });
    }

    #[test]
    fn test_recalculate_range_after_curve_change() {
        let (store, engine) = setup();
        seed_square_curve(&store);

        let readings = vec![
            reading_at(1, Some(2.0), at(2024, 3, 1)),
            reading_at(2, Some(3.0), at(2024, 3, 2)),
        ];
        assert_eq!(engine.process_batch(&readings).succeeded, 2);

        // Steeper calibration effective later; windows overlap and the
        // newer one wins selection.
        let newer = store
            .insert_curve(RatingCurve {
                sensor_id: "AWLR-01".into(),
                coefficient: 2.0,
                exponent: 2.0,
                offset: 0.0,
                effective_from: at(2024, 2, 1),
                effective_to: None,
                ..Default::default()
            })
            .unwrap();

        let outcome = engine
            .recalculate_range("AWLR-01", at(2024, 1, 1), at(2024, 12, 1), &readings)
            .unwrap();
        assert_eq!(
            outcome,
            RecalculationOutcome {
                deleted: 2,
                succeeded: 2,
                failed: 0
            }
        );

        let rows = store
            .for_sensor_between("AWLR-01", at(2024, 1, 1), at(2024, 12, 1), None)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.rating_curve_id == newer));
        let discharges: Vec<f64> = rows.iter().map(|r| r.discharge).collect();
        assert_eq!(discharges, vec![8.0, 18.0]);
    }

    #[test]
    fn test_recalculate_ignores_out_of_scope_readings() {
        let (store, engine) = setup();
        seed_square_curve(&store);

        let readings = vec![
            reading_at(1, Some(2.0), at(2024, 3, 1)),
            reading_at(2, Some(3.0), at(2025, 1, 1)), // outside window
        ];
        let outcome = engine
            .recalculate_range("AWLR-01", at(2024, 1, 1), at(2024, 12, 1), &readings)
            .unwrap();
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(store.discharge_count(), 1);
    }

    #[test]
    fn test_summary_filters_source_and_window() {
        let (store, engine) = setup();
        seed_square_curve(&store);

        engine.on_created(&reading_at(1, Some(1.0), at(2024, 3, 1)));
        engine.on_created(&reading_at(2, Some(2.0), at(2024, 3, 2)));
        let mut forecast = reading_at(3, Some(3.0), at(2024, 3, 3));
        forecast.source = ReadingSource::Predicted;
        engine.on_created(&forecast);

        let all = engine
            .summary_for("AWLR-01", at(2024, 3, 1), at(2024, 4, 1), None)
            .unwrap();
        assert_eq!(all.count, 3);
        assert_eq!(all.max_discharge, Some(9.0));
        assert_eq!(all.latest.unwrap().discharge, 9.0);

        let actual = engine
            .summary_for(
                "AWLR-01",
                at(2024, 3, 1),
                at(2024, 4, 1),
                Some(ReadingSource::Actual),
            )
            .unwrap();
        assert_eq!(actual.count, 2);
        assert_eq!(actual.max_discharge, Some(4.0));
        assert_eq!(actual.mean_discharge, Some(2.5));

        let empty = engine
            .summary_for("AWLR-01", at(2023, 1, 1), at(2024, 1, 1), None)
            .unwrap();
        assert_eq!(empty.count, 0);
    }

    #[test]
    fn test_classification_uses_template_parameter() {
        let (store, engine) = setup();
        seed_square_curve(&store);
        // Bands over discharge: 6.25 lands in the danger band even
        // though the water level itself is below 5
        assign_bands(
            &store,
            ThresholdParameter::Discharge,
            vec![
                level(1, 0.0, Some(5.0), Severity::Normal, false),
                level(2, 5.0, None, Severity::Danger, true),
            ],
        );

        let outcome = engine.on_created(&reading(1, Some(2.5)));
        assert_eq!(severity_of(&outcome), Some(Severity::Danger));
    }

    #[test]
    fn test_classification_over_water_level() {
        let (store, engine) = setup();
        seed_square_curve(&store);
        assign_bands(
            &store,
            ThresholdParameter::WaterLevel,
            vec![
                level(1, 0.0, Some(1.0), Severity::Normal, false),
                level(2, 1.0, Some(2.0), Severity::Warning, false),
                level(3, 2.0, None, Severity::Danger, true),
            ],
        );

        let outcome = engine.on_created(&reading(1, Some(2.5)));
        assert_eq!(severity_of(&outcome), Some(Severity::Danger));
    }

    #[test]
    fn test_below_range_policy_comes_from_config() {
        let bands = || {
            vec![
                level(1, 1.0, Some(2.0), Severity::Normal, false),
                level(2, 2.0, None, Severity::Danger, false),
            ]
        };

        let (store, engine) = setup();
        seed_square_curve(&store);
        assign_bands(&store, ThresholdParameter::WaterLevel, bands());
        let outcome = engine.on_created(&reading(1, Some(0.5)));
        match outcome {
            ProcessOutcome::Calculated(calc) => {
                assert_eq!(calc.classification, Classification::Unclassified)
            }
            other => panic!("expected Calculated, got {:?}", other),
        }

        let store = Arc::new(MemoryStore::new());
        let engine = DischargeEngine::with_config(
            store.clone(),
            store.clone(),
            store.clone(),
            EngineConfig {
                below_range_policy: BelowRangePolicy::ClampToLowest,
                ..Default::default()
            },
        );
        seed_square_curve(&store);
        assign_bands(&store, ThresholdParameter::WaterLevel, bands());
        let outcome = engine.on_created(&reading(1, Some(0.5)));
        assert_eq!(severity_of(&outcome), Some(Severity::Normal));
    }
}
