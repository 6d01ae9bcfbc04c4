//! Processing Outcomes and Engine Errors

use rating_curve::DomainError;
use serde::{Deserialize, Serialize};
use storage::{CalculatedDischarge, StorageError};
use thiserror::Error;
use threshold::Classification;

/// Errors the engine can absorb while processing a reading
#[derive(Debug, Error)]
pub enum EngineError {
    /// The rating-curve formula rejected the water level
    #[error("Calculation error: {0}")]
    Domain(#[from] DomainError),

    /// A store operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A persisted discharge together with its severity classification.
#[derive(Debug, Clone)]
pub struct Calculation {
    pub discharge: CalculatedDischarge,
    pub classification: Classification,
}

/// What processing one reading event amounted to.
///
/// Processing never returns `Err` and never panics: failures are
/// logged, folded into `Failed`, and must not block the reading write
/// that triggered them.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Discharge computed, stored, and classified
    Calculated(Calculation),
    /// No active rating curve covers the reading's timestamp
    NoCurve,
    /// The reading carries no water level
    NoValue,
    /// An update left the water level unchanged; nothing to redo
    Unchanged,
    /// A deletion cascaded to this many derived records
    Removed { rows: usize },
    /// Calculation or persistence of the derived record failed
    Failed(EngineError),
}

impl ProcessOutcome {
    pub fn is_calculated(&self) -> bool {
        matches!(self, ProcessOutcome::Calculated(_))
    }
}

/// Accounting for a batch run. Anything short of a stored calculation
/// counts as failed, matching how batch reprocessing is reported to
/// operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

/// Accounting for a recalculation pass after a curve edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecalculationOutcome {
    /// Stale records removed before reprocessing
    pub deleted: usize,
    pub succeeded: usize,
    pub failed: usize,
}
