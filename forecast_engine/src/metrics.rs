//! Forecast accuracy metrics

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Point-forecast accuracy over a set of (forecast, actual) pairs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, in percent; zero actuals are skipped
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error, in percent
    pub smape: f64,
}

/// Calculate accuracy metrics for a forecast
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::DataError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = forecast.len() as f64;

    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    let (pct_sum, pct_count) = actual
        .iter()
        .zip(errors.iter())
        .filter(|(&a, _)| a != 0.0)
        .fold((0.0, 0usize), |(sum, count), (&a, &e)| {
            (sum + e.abs() / a.abs() * 100.0, count + 1)
        });
    let mape = if pct_count > 0 {
        pct_sum / pct_count as f64
    } else {
        0.0
    };

    let smape = actual
        .iter()
        .zip(forecast.iter())
        .map(|(&a, &f)| {
            let abs_a = a.abs();
            let abs_f = f.abs();
            if abs_a + abs_f == 0.0 {
                0.0
            } else {
                200.0 * (a - f).abs() / (abs_a + abs_f)
            }
        })
        .sum::<f64>()
        / n;

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse,
        mape,
        smape,
    })
}

/// Share of actuals inside their `[lower, upper]` band, in [0, 1]
pub fn interval_coverage(actual: &[f64], bounds: &[(f64, f64)]) -> Result<f64> {
    if actual.len() != bounds.len() || actual.is_empty() {
        return Err(ForecastError::DataError(
            "Actual values and bounds must have the same non-zero length".to_string(),
        ));
    }

    let inside = actual
        .iter()
        .zip(bounds.iter())
        .filter(|(&a, &(lo, hi))| a >= lo && a <= hi)
        .count();

    Ok(inside as f64 / actual.len() as f64)
}
