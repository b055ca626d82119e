//! Rule-based trading insight from the latest indicators and the final forecast

use crate::error::{ForecastError, Result};
use crate::models::ForecastPoint;
use crate::sentiment::SentimentSnapshot;
use crate::table::PriceFeatureRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RSI below this is oversold
pub const RSI_OVERSOLD: f64 = 30.0;
/// RSI above this is overbought
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// Expected change (percent) beyond which a forecast trend is strong
pub const STRONG_MOVE_PCT: f64 = 1.5;

/// Momentum reading from RSI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSignal {
    /// RSI below 30
    Oversold,
    /// RSI in [30, 70]
    Neutral,
    /// RSI above 70
    Overbought,
}

impl RsiSignal {
    /// Classify an RSI value
    pub fn classify(rsi: f64) -> Self {
        if rsi < RSI_OVERSOLD {
            RsiSignal::Oversold
        } else if rsi > RSI_OVERBOUGHT {
            RsiSignal::Overbought
        } else {
            RsiSignal::Neutral
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            RsiSignal::Oversold => "OVERSOLD (Consider Buying)",
            RsiSignal::Neutral => "NEUTRAL",
            RsiSignal::Overbought => "OVERBOUGHT (Consider Selling)",
        }
    }
}

/// Trend read from price against the short and long SMAs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechTrend {
    /// price > short SMA > long SMA
    StrongUptrend,
    /// price < short SMA < long SMA
    StrongDowntrend,
    /// Anything else, ties included
    Consolidating,
}

impl TechTrend {
    /// Classify price against its moving averages
    pub fn classify(price: f64, sma_short: f64, sma_long: f64) -> Self {
        if price > sma_short && sma_short > sma_long {
            TechTrend::StrongUptrend
        } else if price < sma_short && sma_short < sma_long {
            TechTrend::StrongDowntrend
        } else {
            TechTrend::Consolidating
        }
    }

    /// Action implied by the trend
    pub fn action(&self) -> Action {
        match self {
            TechTrend::StrongUptrend => Action::BuyOrHold,
            TechTrend::StrongDowntrend => Action::Sell,
            TechTrend::Consolidating => Action::Wait,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            TechTrend::StrongUptrend => "STRONG UPTREND",
            TechTrend::StrongDowntrend => "STRONG DOWNTREND",
            TechTrend::Consolidating => "CONSOLIDATING",
        }
    }
}

/// Suggested position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Enter or keep a long position
    BuyOrHold,
    /// Exit or go short
    Sell,
    /// Stay out
    Wait,
}

impl Action {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Action::BuyOrHold => "BUY / HOLD",
            Action::Sell => "SELL",
            Action::Wait => "WAIT",
        }
    }
}

/// Direction and size of the expected move to the final forecast date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastTrend {
    /// More than +1.5%
    StrongBullish,
    /// Above 0% up to +1.5%
    SlightlyBullish,
    /// Below -1.5%
    StrongBearish,
    /// From -1.5% up to 0%, zero included
    SlightlyBearish,
}

impl ForecastTrend {
    /// Classify an expected change in percent
    pub fn classify(pct_change: f64) -> Self {
        if pct_change > STRONG_MOVE_PCT {
            ForecastTrend::StrongBullish
        } else if pct_change > 0.0 {
            ForecastTrend::SlightlyBullish
        } else if pct_change < -STRONG_MOVE_PCT {
            ForecastTrend::StrongBearish
        } else {
            ForecastTrend::SlightlyBearish
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            ForecastTrend::StrongBullish => "Strong Bullish",
            ForecastTrend::SlightlyBullish => "Slightly Bullish",
            ForecastTrend::StrongBearish => "Strong Bearish",
            ForecastTrend::SlightlyBearish => "Slightly Bearish",
        }
    }
}

macro_rules! display_via_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_via_label!(RsiSignal, TechTrend, Action, ForecastTrend);

/// Indicator-only signal for the latest row, no forecast involved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    /// Date of the row
    pub date: NaiveDate,
    /// Latest close
    pub price: f64,
    /// Short SMA
    pub sma_short: f64,
    /// Long SMA
    pub sma_long: f64,
    /// RSI
    pub rsi: f64,
    /// RSI classification
    pub rsi_signal: RsiSignal,
    /// Trend classification
    pub tech_trend: TechTrend,
    /// Action implied by the trend
    pub action: Action,
}

impl TechnicalSnapshot {
    /// Classify the latest feature row
    pub fn from_row(row: &PriceFeatureRow) -> Result<Self> {
        check_price(row.close)?;
        let tech_trend = TechTrend::classify(row.close, row.sma_short, row.sma_long);
        Ok(Self {
            date: row.date,
            price: row.close,
            sma_short: row.sma_short,
            sma_long: row.sma_long,
            rsi: row.rsi,
            rsi_signal: RsiSignal::classify(row.rsi),
            tech_trend,
            action: tech_trend.action(),
        })
    }
}

/// Everything an alert needs: price levels, forecast, classifications, sentiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    /// Date of the latest observation
    pub as_of: NaiveDate,
    /// Latest close
    pub current_price: f64,
    /// Point forecast on the final horizon date
    pub predicted_price: f64,
    /// Lower band edge on the final horizon date
    pub lower_bound: f64,
    /// Upper band edge on the final horizon date
    pub upper_bound: f64,
    /// Final horizon date
    pub forecast_date: NaiveDate,
    /// Horizon length in days
    pub days_ahead: usize,
    /// Expected change in percent
    pub pct_change: f64,
    /// Forecast trend classification
    pub forecast_trend: ForecastTrend,
    /// Short SMA
    pub sma_short: f64,
    /// Long SMA
    pub sma_long: f64,
    /// RSI
    pub rsi: f64,
    /// RSI classification
    pub rsi_signal: RsiSignal,
    /// Trend classification
    pub tech_trend: TechTrend,
    /// Action implied by the trend
    pub action: Action,
    /// Headline sentiment, passed through unchanged
    pub sentiment: Option<SentimentSnapshot>,
    /// Regressors assumed flat over the horizon
    #[serde(default)]
    pub held_regressors: Vec<String>,
}

impl InsightRecord {
    /// Record which regressors the forecast held constant
    pub fn with_held_regressors(mut self, held: Vec<String>) -> Self {
        self.held_regressors = held;
        self
    }
}

/// Combine the latest feature row and the final forecast point into an insight.
///
/// Each classification is independent; sentiment never changes them.
pub fn synthesize_insight(
    latest: &PriceFeatureRow,
    final_point: &ForecastPoint,
    days_ahead: usize,
    sentiment: Option<&SentimentSnapshot>,
) -> Result<InsightRecord> {
    let technical = TechnicalSnapshot::from_row(latest)?;
    let current_price = latest.close;
    let pct_change = (final_point.yhat - current_price) / current_price * 100.0;

    Ok(InsightRecord {
        as_of: latest.date,
        current_price,
        predicted_price: final_point.yhat,
        lower_bound: final_point.yhat_lower,
        upper_bound: final_point.yhat_upper,
        forecast_date: final_point.date,
        days_ahead,
        pct_change,
        forecast_trend: ForecastTrend::classify(pct_change),
        sma_short: technical.sma_short,
        sma_long: technical.sma_long,
        rsi: technical.rsi,
        rsi_signal: technical.rsi_signal,
        tech_trend: technical.tech_trend,
        action: technical.action,
        sentiment: sentiment.cloned(),
        held_regressors: Vec::new(),
    })
}

fn check_price(price: f64) -> Result<()> {
    if price == 0.0 || !price.is_finite() {
        return Err(ForecastError::DegenerateMarketState(format!(
            "Current price must be a non-zero number, got {}",
            price
        )));
    }
    Ok(())
}
