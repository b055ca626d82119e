//! # Trade Math
//!
//! Rolling indicator calculations used to build feature tables for daily
//! price forecasting.
//!
//! Every indicator comes in two shapes:
//! - a streaming struct fed one value at a time (`update` / `value`)
//! - a batch helper returning one `Option<f64>` per input row, `None` while the
//!   indicator is still warming up

use thiserror::Error;

// Indicator modules
pub mod moving_averages;
pub mod oscillators;

pub use moving_averages::{sma_series, SimpleMovingAverage};
pub use oscillators::{rsi_series, RelativeStrengthIndex};

/// Errors that can occur in indicator calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Reject NaN and infinite inputs before they poison a rolling window.
pub(crate) fn ensure_finite(value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MathError::InvalidInput(format!(
            "Indicator input must be finite, got {}",
            value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(1.5).is_ok());
        assert!(matches!(
            ensure_finite(f64::NAN),
            Err(MathError::InvalidInput(_))
        ));
        assert!(ensure_finite(f64::INFINITY).is_err());
    }
}
