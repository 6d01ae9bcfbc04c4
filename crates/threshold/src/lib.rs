//! Threshold Classification
//!
//! Provides severity bands for water level and discharge values,
//! template validation, and band classification with an explicit
//! below-range policy.

mod classify;
mod error;
mod level;
mod template;

pub use classify::{classify, BelowRangePolicy, Classification};
pub use error::ThresholdError;
pub use level::{Severity, ThresholdLevel};
pub use template::{ThresholdParameter, ThresholdTemplate};
