//! Storage Layer
//!
//! Provides the repository contracts the discharge engine depends on,
//! the derived-record types they exchange, and an in-memory reference
//! store. Database-backed implementations live with the embedding
//! host; the engine only sees these traits.

mod memory;
mod records;

pub use memory::MemoryStore;
pub use records::{CalculatedDischarge, ReadingSource, ThresholdAssignment};

use chrono::{DateTime, Utc};
use rating_curve::RatingCurve;
use thiserror::Error;
use threshold::{ThresholdError, ThresholdTemplate};

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying backend failure (connection, lock, query)
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Record not found")]
    NotFound,
    /// Template rejected at insert because its band layout is invalid
    #[error("Invalid threshold template: {0}")]
    InvalidTemplate(#[from] ThresholdError),
}

/// Access to calibrated rating curves.
pub trait CurveStore: Send + Sync {
    /// All curves recorded for a sensor, active or not.
    fn curves_for_sensor(&self, sensor_id: &str) -> Result<Vec<RatingCurve>, StorageError>;

    /// The curve applicable to a reading observed at `at`, if any.
    /// `Ok(None)` is the ordinary "no curve configured" case, not an
    /// error.
    fn curve_for(
        &self,
        sensor_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<RatingCurve>, StorageError>;

    /// Store a curve and return its assigned id.
    fn insert_curve(&self, curve: RatingCurve) -> Result<i64, StorageError>;

    fn delete_curve(&self, curve_id: i64) -> Result<(), StorageError>;
}

/// Access to calculated discharge records.
pub trait DischargeStore: Send + Sync {
    /// Store a record and return its assigned id.
    fn insert(&self, record: CalculatedDischarge) -> Result<i64, StorageError>;

    fn for_reading(&self, reading_id: i64) -> Result<Vec<CalculatedDischarge>, StorageError>;

    /// Remove every record derived from a reading; returns the count.
    fn delete_for_reading(&self, reading_id: i64) -> Result<usize, StorageError>;

    /// Records for one sensor observed in `[from, to)`, optionally
    /// narrowed to a single reading source.
    fn for_sensor_between(
        &self,
        sensor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        source: Option<ReadingSource>,
    ) -> Result<Vec<CalculatedDischarge>, StorageError>;

    /// Bulk removal companion of [`for_sensor_between`]; returns the
    /// count. Used when a rating-curve edit invalidates a window.
    ///
    /// [`for_sensor_between`]: DischargeStore::for_sensor_between
    fn delete_for_sensor_between(
        &self,
        sensor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        source: Option<ReadingSource>,
    ) -> Result<usize, StorageError>;
}

/// Access to threshold templates through per-sensor assignments.
pub trait ThresholdStore: Send + Sync {
    /// Resolve the template assigned to a sensor at `at`. Assignments
    /// carry half-open effective windows like curves; the latest
    /// `effective_from` wins on overlap. `Ok(None)` when the sensor
    /// has no applicable assignment or the template was deactivated.
    fn template_for_sensor(
        &self,
        sensor_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ThresholdTemplate>, StorageError>;
}
