//! Discharge Engine
//!
//! Provides the event-driven core of the flood early-warning pipeline:
//! reading lifecycle events trigger rating-curve selection, discharge
//! calculation, persistence of the derived record, and severity
//! classification. Failures are absorbed into outcomes so the reading
//! write that triggered them is never blocked.

mod config;
mod engine;
mod locks;
mod outcome;
mod reading;
mod summary;
mod worker;

pub use self::config::EngineConfig;
pub use engine::DischargeEngine;
pub use outcome::{BatchOutcome, Calculation, EngineError, ProcessOutcome, RecalculationOutcome};
pub use reading::{ReadingEvent, SensorReading};
pub use summary::{DischargeSummary, SummaryPoint};
pub use worker::{DischargeWorker, WorkerStats};

pub use storage::ReadingSource;
