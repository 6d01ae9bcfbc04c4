//! In-Memory Store

use crate::records::{CalculatedDischarge, ReadingSource, ThresholdAssignment};
use crate::{CurveStore, DischargeStore, StorageError, ThresholdStore};
use chrono::{DateTime, Utc};
use rating_curve::{find_overlaps, select_curve, RatingCurve};
use std::sync::{Mutex, MutexGuard};
use threshold::ThresholdTemplate;
use tracing::{debug, info, warn};

/// Reference implementation of all three store traits.
///
/// Backs the engine's tests and small embedded deployments. Ids are
/// assigned monotonically per record family, mirroring what a database
/// sequence would hand out.
pub struct MemoryStore {
    curves: Mutex<Vec<RatingCurve>>,
    discharges: Mutex<Vec<CalculatedDischarge>>,
    templates: Mutex<Vec<ThresholdTemplate>>,
    assignments: Mutex<Vec<ThresholdAssignment>>,
    next_curve_id: Mutex<i64>,
    next_discharge_id: Mutex<i64>,
    next_template_id: Mutex<i64>,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    m.lock()
        .map_err(|e| StorageError::Backend(format!("Lock poisoned: {}", e)))
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self {
            curves: Mutex::new(Vec::new()),
            discharges: Mutex::new(Vec::new()),
            templates: Mutex::new(Vec::new()),
            assignments: Mutex::new(Vec::new()),
            next_curve_id: Mutex::new(1),
            next_discharge_id: Mutex::new(1),
            next_template_id: Mutex::new(1),
        }
    }

    /// Store a threshold template and return its assigned id. The
    /// band layout is validated here so classification can trust it.
    pub fn insert_template(&self, mut template: ThresholdTemplate) -> Result<i64, StorageError> {
        template.validate()?;

        let mut templates = lock(&self.templates)?;
        let mut next = lock(&self.next_template_id)?;
        template.id = *next;
        *next += 1;

        let id = template.id;
        templates.push(template);
        debug!("Inserted threshold template {}", id);
        Ok(id)
    }

    /// Bind a sensor to a stored template over an effective window.
    pub fn assign_template(&self, assignment: ThresholdAssignment) -> Result<(), StorageError> {
        {
            let templates = lock(&self.templates)?;
            if !templates.iter().any(|t| t.id == assignment.template_id) {
                return Err(StorageError::NotFound);
            }
        }

        let mut assignments = lock(&self.assignments)?;
        info!(
            "Assigning template {} to sensor {}",
            assignment.template_id, assignment.sensor_id
        );
        assignments.push(assignment);
        Ok(())
    }

    /// Total calculated discharge records held
    pub fn discharge_count(&self) -> usize {
        self.discharges.lock().map(|d| d.len()).unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut curves) = self.curves.lock() {
            curves.clear();
        }
        if let Ok(mut discharges) = self.discharges.lock() {
            discharges.clear();
        }
        if let Ok(mut templates) = self.templates.lock() {
            templates.clear();
        }
        if let Ok(mut assignments) = self.assignments.lock() {
            assignments.clear();
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CurveStore for MemoryStore {
    fn curves_for_sensor(&self, sensor_id: &str) -> Result<Vec<RatingCurve>, StorageError> {
        let curves = lock(&self.curves)?;
        Ok(curves
            .iter()
            .filter(|c| c.sensor_id == sensor_id)
            .cloned()
            .collect())
    }

    fn curve_for(
        &self,
        sensor_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<RatingCurve>, StorageError> {
        let candidates = self.curves_for_sensor(sensor_id)?;
        Ok(select_curve(&candidates, at).cloned())
    }

    fn insert_curve(&self, mut curve: RatingCurve) -> Result<i64, StorageError> {
        let mut curves = lock(&self.curves)?;
        let mut next = lock(&self.next_curve_id)?;
        curve.id = *next;
        *next += 1;

        let id = curve.id;
        let sensor_id = curve.sensor_id.clone();
        curves.push(curve);

        // Overlapping active windows are tolerated by selection but
        // worth surfacing to the operator.
        for (a, b) in find_overlaps(&curves) {
            if a == id || b == id {
                let other = if a == id { b } else { a };
                warn!(
                    "Rating curve {} overlaps curve {} for sensor {}",
                    id, other, sensor_id
                );
            }
        }

        debug!("Inserted rating curve {} for sensor {}", id, sensor_id);
        Ok(id)
    }

    fn delete_curve(&self, curve_id: i64) -> Result<(), StorageError> {
        let mut curves = lock(&self.curves)?;
        let before = curves.len();
        curves.retain(|c| c.id != curve_id);
        if curves.len() == before {
            return Err(StorageError::NotFound);
        }
        debug!("Deleted rating curve {}", curve_id);
        Ok(())
    }
}

impl DischargeStore for MemoryStore {
    fn insert(&self, mut record: CalculatedDischarge) -> Result<i64, StorageError> {
        let mut discharges = lock(&self.discharges)?;
        let mut next = lock(&self.next_discharge_id)?;
        record.id = *next;
        *next += 1;

        let id = record.id;
        discharges.push(record);
        debug!("Inserted discharge record {}", id);
        Ok(id)
    }

    fn for_reading(&self, reading_id: i64) -> Result<Vec<CalculatedDischarge>, StorageError> {
        let discharges = lock(&self.discharges)?;
        Ok(discharges
            .iter()
            .filter(|d| d.reading_id == reading_id)
            .cloned()
            .collect())
    }

    fn delete_for_reading(&self, reading_id: i64) -> Result<usize, StorageError> {
        let mut discharges = lock(&self.discharges)?;
        let before = discharges.len();
        discharges.retain(|d| d.reading_id != reading_id);
        let removed = before - discharges.len();
        if removed > 0 {
            debug!(
                "Deleted {} discharge record(s) for reading {}",
                removed, reading_id
            );
        }
        Ok(removed)
    }

    fn for_sensor_between(
        &self,
        sensor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        source: Option<ReadingSource>,
    ) -> Result<Vec<CalculatedDischarge>, StorageError> {
        let discharges = lock(&self.discharges)?;
        Ok(discharges
            .iter()
            .filter(|d| {
                d.sensor_id == sensor_id
                    && d.observed_at >= from
                    && d.observed_at < to
                    && source.map_or(true, |s| d.source == s)
            })
            .cloned()
            .collect())
    }

    fn delete_for_sensor_between(
        &self,
        sensor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        source: Option<ReadingSource>,
    ) -> Result<usize, StorageError> {
        let mut discharges = lock(&self.discharges)?;
        let before = discharges.len();
        discharges.retain(|d| {
            !(d.sensor_id == sensor_id
                && d.observed_at >= from
                && d.observed_at < to
                && source.map_or(true, |s| d.source == s))
        });
        let removed = before - discharges.len();
        debug!(
            "Deleted {} discharge record(s) for sensor {} in window",
            removed, sensor_id
        );
        Ok(removed)
    }
}

impl ThresholdStore for MemoryStore {
    fn template_for_sensor(
        &self,
        sensor_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ThresholdTemplate>, StorageError> {
        let template_id = {
            let assignments = lock(&self.assignments)?;
            let chosen = assignments
                .iter()
                .filter(|a| a.is_active && a.sensor_id == sensor_id && a.window_contains(at))
                .max_by(|x, y| {
                    x.effective_from
                        .cmp(&y.effective_from)
                        .then(x.template_id.cmp(&y.template_id))
                });
            match chosen {
                Some(a) => a.template_id,
                None => return Ok(None),
            }
        };

        let templates = lock(&self.templates)?;
        let template = templates
            .iter()
            .find(|t| t.id == template_id)
            .ok_or(StorageError::NotFound)?;

        if !template.is_active {
            debug!(
                "Template {} assigned to sensor {} is inactive",
                template_id, sensor_id
            );
            return Ok(None);
        }
        Ok(Some(template.clone()))
    }
}
