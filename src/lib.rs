//! # Forecast Signal
//!
//! Workspace facade over the indicator math and the forecasting engine.
//!
//! ## Example
//!
//! ```
//! use forecast_signal_workspace::trade_math::sma_series;
//!
//! let sma = sma_series(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
//! assert_eq!(sma, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
//! ```

pub use forecast_engine;
pub use trade_math;

/// Indicator windows used when none are configured: short SMA, long SMA, RSI.
pub fn default_indicator_windows() -> (usize, usize, usize) {
    let config = forecast_engine::IndicatorConfig::default();
    (config.sma_short, config.sma_long, config.rsi_period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        assert_eq!(default_indicator_windows(), (20, 50, 14));
    }

    #[test]
    fn test_reexports_share_types() {
        let err: forecast_engine::ForecastError =
            trade_math::MathError::InvalidInput("bad".to_string()).into();
        assert!(matches!(err, forecast_engine::ForecastError::MathError(_)));
    }
}
