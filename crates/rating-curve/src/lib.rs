//! Rating Curve Evaluation
//!
//! Provides stage-discharge rating curves with effective date windows,
//! pure discharge computation, and curve selection by timestamp.

mod curve;
mod error;
mod formula;
mod selector;

pub use curve::RatingCurve;
pub use error::DomainError;
pub use formula::{compute_discharge, FormulaKind, WEIR_EXPONENT};
pub use selector::{find_overlaps, select_curve};
