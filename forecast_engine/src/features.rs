//! Technical indicators derived from a close series

use crate::config::IndicatorConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use trade_math::{rsi_series, sma_series};

/// Indicator values for one row; `None` while a window is still filling
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValues {
    /// Short SMA (20 periods by default)
    pub sma_short: Option<f64>,
    /// Long SMA (50 periods by default)
    pub sma_long: Option<f64>,
    /// Wilder RSI (14 periods by default)
    pub rsi: Option<f64>,
}

impl IndicatorValues {
    /// All three indicators, if every one is defined
    pub fn complete(&self) -> Option<(f64, f64, f64)> {
        Some((self.sma_short?, self.sma_long?, self.rsi?))
    }
}

/// Computes SMA/SMA/RSI over a close series without lookahead
#[derive(Debug, Clone, Default)]
pub struct FeatureDeriver {
    config: IndicatorConfig,
}

impl FeatureDeriver {
    /// Create a deriver with the given windows
    pub fn new(config: IndicatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Indicator windows in use
    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// One `IndicatorValues` per close, same length and order as the input
    pub fn derive(&self, closes: &[f64]) -> Result<Vec<IndicatorValues>> {
        let sma_short = sma_series(closes, self.config.sma_short)?;
        let sma_long = sma_series(closes, self.config.sma_long)?;
        let rsi = rsi_series(closes, self.config.rsi_period)?;

        Ok(sma_short
            .into_iter()
            .zip(sma_long)
            .zip(rsi)
            .map(|((sma_short, sma_long), rsi)| IndicatorValues {
                sma_short,
                sma_long,
                rsi,
            })
            .collect())
    }
}
