//! Formula Domain Errors

use thiserror::Error;

/// Errors from evaluating a rating-curve formula on an out-of-domain input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Negative base with a fractional exponent has no real-valued power
    #[error("negative base {base} raised to fractional exponent {exponent} is undefined")]
    NegativeBase { base: f64, exponent: f64 },

    /// The computed discharge overflowed or produced NaN
    #[error("discharge for water level {water_level} is not finite")]
    NonFinite { water_level: f64 },
}
