//! Relative Strength Index (RSI) with Wilder smoothing
//!
//! The first average gain and loss are the simple means of the first `period`
//! price changes. Every later change is folded in with
//! `avg = (prev_avg * (period - 1) + current) / period`.

use crate::{ensure_finite, MathError, Result};

/// RSI value reported for a window with neither gains nor losses.
pub const FLAT_RSI: f64 = 50.0;

/// Relative Strength Index (RSI) implementation
#[derive(Debug, Clone)]
pub struct RelativeStrengthIndex {
    period: usize,
    previous_price: Option<f64>,
    changes_seen: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: Option<f64>,
    avg_loss: Option<f64>,
}

impl RelativeStrengthIndex {
    /// Create a new RSI with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            previous_price: None,
            changes_seen: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: None,
            avg_loss: None,
        })
    }

    /// Update the RSI with a new price value
    pub fn update(&mut self, price: f64) -> Result<()> {
        ensure_finite(price)?;

        if let Some(prev_price) = self.previous_price {
            let change = price - prev_price;
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);
            self.changes_seen += 1;

            match (self.avg_gain, self.avg_loss) {
                (Some(avg_gain), Some(avg_loss)) => {
                    let n = self.period as f64;
                    self.avg_gain = Some((avg_gain * (n - 1.0) + gain) / n);
                    self.avg_loss = Some((avg_loss * (n - 1.0) + loss) / n);
                }
                _ => {
                    self.gain_sum += gain;
                    self.loss_sum += loss;

                    // Seed the Wilder averages once a full window of changes exists
                    if self.changes_seen == self.period {
                        self.avg_gain = Some(self.gain_sum / self.period as f64);
                        self.avg_loss = Some(self.loss_sum / self.period as f64);
                    }
                }
            }
        }

        self.previous_price = Some(price);

        Ok(())
    }

    /// Whether a full window of price changes has been seen
    pub fn is_ready(&self) -> bool {
        self.avg_gain.is_some() && self.avg_loss.is_some()
    }

    /// Get the current RSI value (0-100)
    pub fn value(&self) -> Result<f64> {
        match (self.avg_gain, self.avg_loss) {
            (Some(avg_gain), Some(avg_loss)) => {
                if avg_loss == 0.0 && avg_gain == 0.0 {
                    return Ok(FLAT_RSI);
                }
                if avg_loss == 0.0 {
                    return Ok(100.0);
                }

                let rs = avg_gain / avg_loss;
                Ok(100.0 - (100.0 / (1.0 + rs)))
            }
            _ => Err(MathError::InsufficientData(format!(
                "Not enough data for RSI calculation. Need {} values, have {}.",
                self.period + 1,
                self.changes_seen + usize::from(self.previous_price.is_some())
            ))),
        }
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the RSI, clearing all values
    pub fn reset(&mut self) {
        self.previous_price = None;
        self.changes_seen = 0;
        self.gain_sum = 0.0;
        self.loss_sum = 0.0;
        self.avg_gain = None;
        self.avg_loss = None;
    }
}

/// RSI for every row of `prices`.
///
/// The first `period` entries are `None` (a full window of `period` changes
/// needs `period + 1` prices).
pub fn rsi_series(prices: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut rsi = RelativeStrengthIndex::new(period)?;
    let mut out = Vec::with_capacity(prices.len());

    for &price in prices {
        rsi.update(price)?;
        out.push(if rsi.is_ready() { Some(rsi.value()?) } else { None });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_rsi_calculation() {
        let mut rsi = RelativeStrengthIndex::new(14).unwrap();

        // Alternating up/down moves with larger ups
        let prices = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28,
        ];

        for (i, price) in prices.iter().enumerate() {
            rsi.update(*price).unwrap();
            if i < 14 {
                assert!(rsi.value().is_err(), "RSI defined too early at row {}", i);
            }
        }

        // Classic Wilder worked example: first RSI is ~70.46
        assert_approx_eq!(rsi.value().unwrap(), 70.46, 0.05);
    }

    #[test]
    fn test_rsi_bounds() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let falling: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let flat = vec![100.0; 30];

        assert_eq!(rsi_series(&rising, 14).unwrap()[29], Some(100.0));
        assert_eq!(rsi_series(&falling, 14).unwrap()[29], Some(0.0));
        assert_eq!(rsi_series(&flat, 14).unwrap()[29], Some(FLAT_RSI));
    }

    #[test]
    fn test_rsi_series_warmup() {
        let prices: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let series = rsi_series(&prices, 14).unwrap();

        assert_eq!(series.len(), prices.len());
        assert!(series[..14].iter().all(Option::is_none));
        for value in &series[14..] {
            let value = value.expect("RSI should be defined after warm-up");
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_reset_and_validation() {
        assert!(RelativeStrengthIndex::new(0).is_err());

        let mut rsi = RelativeStrengthIndex::new(2).unwrap();
        for price in [1.0, 2.0, 3.0] {
            rsi.update(price).unwrap();
        }
        assert!(rsi.is_ready());

        rsi.reset();
        assert!(!rsi.is_ready());
        assert!(matches!(rsi.value(), Err(MathError::InsufficientData(_))));
        assert!(rsi.update(f64::NEG_INFINITY).is_err());
    }
}
