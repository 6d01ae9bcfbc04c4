//! Discharge Formula Evaluation

use crate::curve::RatingCurve;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Fixed power used by the rectangular weir equation.
pub const WEIR_EXPONENT: f64 = 1.5;

/// Formula families supported by the calibration workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaKind {
    /// Q = C * (H - A)^B, the standard stage-discharge power law
    Power,
    /// Q = C * B * H^(3/2), rectangular weir; B acts as a width factor
    Weir,
    /// Q = C * (H + A)^B, power law with an additive datum shift
    ShiftedPower,
}

/// Compute discharge Q from water level H using the curve's formula.
///
/// Pure and deterministic. The result is kept at full f64 precision;
/// rounding belongs to presentation, not storage. Fails with
/// [`DomainError`] when the formula base is negative under a fractional
/// exponent, or when the result is not finite.
pub fn compute_discharge(water_level: f64, curve: &RatingCurve) -> Result<f64, DomainError> {
    let q = match curve.kind {
        FormulaKind::Power => {
            let base = water_level - curve.offset;
            curve.coefficient * checked_pow(base, curve.exponent)?
        }
        FormulaKind::Weir => {
            curve.coefficient * curve.exponent * checked_pow(water_level, WEIR_EXPONENT)?
        }
        FormulaKind::ShiftedPower => {
            let base = water_level + curve.offset;
            curve.coefficient * checked_pow(base, curve.exponent)?
        }
    };

    if !q.is_finite() {
        return Err(DomainError::NonFinite { water_level });
    }
    Ok(q)
}

/// `powf` with the negative-base/fractional-exponent case rejected
/// instead of silently returning NaN. Integer exponents on a negative
/// base are well defined and allowed through.
fn checked_pow(base: f64, exponent: f64) -> Result<f64, DomainError> {
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(DomainError::NegativeBase { base, exponent });
    }
    Ok(base.powf(exponent))
}
