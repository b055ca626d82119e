//! Prediction frames: the dates to forecast and the regressor values to use

use crate::config::Frequency;
use crate::error::{ForecastError, Result};
use crate::table::FeatureTable;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// One date to forecast with its regressor values
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRow {
    /// Date to forecast
    pub date: NaiveDate,
    /// Regressor values, ordered like `FutureFrame::regressor_names`
    pub regressors: Vec<f64>,
}

/// Dates and regressor values handed to a fitted model
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FutureFrame {
    regressor_names: Vec<String>,
    rows: Vec<FrameRow>,
    history_len: usize,
}

impl FutureFrame {
    /// Frame over the dates of `table`, using its regressor values verbatim
    pub fn from_table(table: &FeatureTable) -> Self {
        let rows = table
            .rows()
            .iter()
            .map(|r| FrameRow {
                date: r.date,
                regressors: r.regressors.clone(),
            })
            .collect();

        Self {
            regressor_names: table.regressor_names().to_vec(),
            rows,
            history_len: table.len(),
        }
    }

    /// Frame over the dates of `table` plus `horizon` dates beyond its last date.
    ///
    /// Regressors on the added dates hold the last observed value.
    pub fn extend(table: &FeatureTable, horizon: usize, frequency: Frequency) -> Result<Self> {
        let last = table.last().ok_or_else(|| {
            ForecastError::DataUnavailable("Cannot extend an empty table".to_string())
        })?;

        let mut frame = Self::from_table(table);
        let held = last.regressors.clone();
        let mut date = last.date;
        for _ in 0..horizon {
            date = next_date(date, frequency)?;
            frame.rows.push(FrameRow {
                date,
                regressors: held.clone(),
            });
        }

        Ok(frame)
    }

    /// All rows, historical first
    pub fn rows(&self) -> &[FrameRow] {
        &self.rows
    }

    /// Regressor names
    pub fn regressor_names(&self) -> &[String] {
        &self.regressor_names
    }

    /// Number of rows taken from history
    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Number of rows added beyond history
    pub fn horizon_len(&self) -> usize {
        self.rows.len() - self.history_len
    }

    /// Regressors held at their last value on the added rows
    pub fn held_regressors(&self) -> &[String] {
        if self.horizon_len() == 0 {
            &[]
        } else {
            &self.regressor_names
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the frame is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }
}

/// The date following `date` under `frequency`
pub fn next_date(date: NaiveDate, frequency: Frequency) -> Result<NaiveDate> {
    let mut next = step(date)?;
    if frequency == Frequency::Business {
        while matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
            next = step(next)?;
        }
    }
    Ok(next)
}

fn step(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_add_signed(Duration::days(1))
        .ok_or_else(|| ForecastError::DataError(format!("Date overflow after {}", date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::PriceFeatureRow;
    use pretty_assertions::assert_eq;

    fn table(last: NaiveDate) -> FeatureTable {
        let rows = (0..3)
            .map(|i| PriceFeatureRow {
                date: last - Duration::days(2 - i),
                close: 100.0 + i as f64,
                sma_short: 100.0,
                sma_long: 100.0,
                rsi: 50.0,
                regressors: vec![i as f64, 10.0 * i as f64],
            })
            .collect();
        FeatureTable::new(vec!["usd".into(), "yield".into()], rows).unwrap()
    }

    #[test]
    fn test_extend_calendar_holds_regressors() {
        let friday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let frame = FutureFrame::extend(&table(friday), 3, Frequency::Calendar).unwrap();

        assert_eq!(frame.len(), 6);
        assert_eq!(frame.history_len(), 3);
        assert_eq!(frame.horizon_len(), 3);
        assert_eq!(frame.rows()[0].regressors, vec![0.0, 0.0]);
        assert_eq!(frame.rows()[3].date, friday + Duration::days(1));
        assert!(frame.rows()[3..]
            .iter()
            .all(|r| r.regressors == vec![2.0, 20.0]));
        assert_eq!(frame.held_regressors(), &["usd".to_string(), "yield".to_string()]);
    }

    #[test]
    fn test_extend_business_skips_weekends() {
        let friday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let frame = FutureFrame::extend(&table(friday), 2, Frequency::Business).unwrap();

        assert_eq!(
            frame.dates()[3..].to_vec(),
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
            ]
        );
    }

    #[test]
    fn test_zero_horizon_holds_nothing() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let frame = FutureFrame::extend(&table(day), 0, Frequency::Calendar).unwrap();
        assert_eq!(frame.len(), 3);
        assert!(frame.held_regressors().is_empty());
    }

    #[test]
    fn test_extend_empty_table() {
        let empty = FeatureTable::empty(vec![]);
        assert!(matches!(
            FutureFrame::extend(&empty, 5, Frequency::Calendar),
            Err(ForecastError::DataUnavailable(_))
        ));
    }
}
