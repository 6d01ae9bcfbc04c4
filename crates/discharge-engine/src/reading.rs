//! Reading Types and Lifecycle Events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storage::ReadingSource;

/// The projection of a stored water-level reading the engine needs.
///
/// Reading persistence belongs to the host; the engine only ever sees
/// this snapshot, carried by a [`ReadingEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: i64,
    pub sensor_id: String,
    /// Water level in metres; telemetry gaps arrive as `None`
    pub value: Option<f64>,
    /// When the level was observed (or, for predictions, forecast for)
    pub observed_at: DateTime<Utc>,
    pub source: ReadingSource,
}

/// Lifecycle notification for one reading.
///
/// Hosts emit these after committing the reading write, from whatever
/// persistence layer they use. Serde-derived so they can travel over a
/// queue between the writer and the engine worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReadingEvent {
    /// A new reading was stored
    Created(SensorReading),
    /// An existing reading was rewritten; `previous_value` is the
    /// water level before the write, for the dirty check
    Updated {
        reading: SensorReading,
        previous_value: Option<f64>,
    },
    /// A reading was removed
    Deleted { reading_id: i64 },
}
