//! Threshold Error Types

use thiserror::Error;

/// Errors in a threshold template's band layout
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    /// Template defines no bands at all
    #[error("template '{0}' has no levels")]
    Empty(String),

    /// Levels not in ascending order, or a duplicate order value
    #[error("level order {0} is out of sequence")]
    UnorderedLevels(u32),

    /// A band's lower bound sits below the previous band's
    #[error("level order {order} min {min} is below the preceding band")]
    NonMonotonicMin { order: u32, min: f64 },

    /// A band's upper bound does not meet the next band's lower bound
    #[error("level order {order} max {max} does not meet next band min {next_min}")]
    NonContiguous { order: u32, max: f64, next_min: f64 },

    /// Only the last band may leave max_value unset
    #[error("level order {0} is open-ended but not the last band")]
    OpenEndedNotLast(u32),

    /// A band's upper bound is not above its lower bound
    #[error("level order {order} has empty range [{min}, {max})")]
    EmptyBand { order: u32, min: f64, max: f64 },
}
