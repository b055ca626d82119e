//! Date-aligned feature table built from a target series and its regressors

use crate::config::IndicatorConfig;
use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::features::FeatureDeriver;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// One trading day of the model input: target close, indicators and regressors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceFeatureRow {
    /// Trading day (timezone-naive)
    pub date: NaiveDate,
    /// Target close price
    pub close: f64,
    /// Short SMA
    pub sma_short: f64,
    /// Long SMA
    pub sma_long: f64,
    /// Wilder RSI
    pub rsi: f64,
    /// Regressor values, ordered like `FeatureTable::regressor_names`
    pub regressors: Vec<f64>,
}

/// A target row after outer alignment and forward fill, before indicators
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    /// Trading day of the target
    pub date: NaiveDate,
    /// Observed target close (never imputed)
    pub close: f64,
    /// Latest auxiliary values on or before `date`, `None` before a series starts
    pub regressors: Vec<Option<f64>>,
}

/// Feature rows in ascending date order plus the regressor column names
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    regressor_names: Vec<String>,
    rows: Vec<PriceFeatureRow>,
}

impl FeatureTable {
    /// Create a table, checking ordering and row shape
    pub fn new(regressor_names: Vec<String>, rows: Vec<PriceFeatureRow>) -> Result<Self> {
        for (i, name) in regressor_names.iter().enumerate() {
            if regressor_names[..i].contains(name) {
                return Err(ForecastError::InvalidParameter(format!(
                    "Duplicate regressor column '{}'",
                    name
                )));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.regressors.len() != regressor_names.len() {
                return Err(ForecastError::DataError(format!(
                    "Row {} has {} regressor values, expected {}",
                    row.date,
                    row.regressors.len(),
                    regressor_names.len()
                )));
            }
            if !row.close.is_finite() || row.regressors.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::DataError(format!(
                    "Row {} contains a non-finite value",
                    row.date
                )));
            }
            if i > 0 && rows[i - 1].date >= row.date {
                return Err(ForecastError::DataError(format!(
                    "Rows must be strictly ascending by date ({} follows {})",
                    row.date,
                    rows[i - 1].date
                )));
            }
        }

        Ok(Self {
            regressor_names,
            rows,
        })
    }

    /// A table with columns but no rows
    pub fn empty(regressor_names: Vec<String>) -> Self {
        Self {
            regressor_names,
            rows: Vec::new(),
        }
    }

    /// All rows
    pub fn rows(&self) -> &[PriceFeatureRow] {
        &self.rows
    }

    /// Regressor column names
    pub fn regressor_names(&self) -> &[String] {
        &self.regressor_names
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Latest row
    pub fn last(&self) -> Option<&PriceFeatureRow> {
        self.rows.last()
    }

    /// Dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Target closes in order
    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    /// Position of a regressor column
    pub fn regressor_index(&self, name: &str) -> Option<usize> {
        self.regressor_names.iter().position(|n| n == name)
    }

    /// Values of one regressor column
    pub fn regressor_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.regressor_index(name)?;
        Some(self.rows.iter().map(|r| r.regressors[idx]).collect())
    }

    /// Rows `start..end` as a new table with the same columns
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.rows.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Slice {}..{} out of bounds for {} rows",
                start,
                end,
                self.rows.len()
            )));
        }

        Ok(Self {
            regressor_names: self.regressor_names.clone(),
            rows: self.rows[start..end].to_vec(),
        })
    }

    /// Export as a polars DataFrame (`ds`, `y`, indicators, one column per regressor)
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Series::new(
                "ds",
                self.rows
                    .iter()
                    .map(|r| r.date.to_string())
                    .collect::<Vec<String>>(),
            ),
            Series::new("y", self.closes()),
            Series::new(
                "sma_short",
                self.rows.iter().map(|r| r.sma_short).collect::<Vec<f64>>(),
            ),
            Series::new(
                "sma_long",
                self.rows.iter().map(|r| r.sma_long).collect::<Vec<f64>>(),
            ),
            Series::new("rsi", self.rows.iter().map(|r| r.rsi).collect::<Vec<f64>>()),
        ];

        for (idx, name) in self.regressor_names.iter().enumerate() {
            columns.push(Series::new(
                name.as_str(),
                self.rows
                    .iter()
                    .map(|r| r.regressors[idx])
                    .collect::<Vec<f64>>(),
            ));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Write the table as CSV
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut df = self.to_dataframe()?;
        write_dataframe_csv(&mut df, path)
    }
}

/// Write a DataFrame to a CSV file with a header row
pub(crate) fn write_dataframe_csv<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).has_header(true).finish(df)?;
    Ok(())
}

/// Aligns a target with auxiliary series and attaches indicators
#[derive(Debug, Clone, Default)]
pub struct RegressorSeriesBuilder {
    deriver: FeatureDeriver,
}

impl RegressorSeriesBuilder {
    /// Create a builder with the given indicator windows
    pub fn new(config: IndicatorConfig) -> Result<Self> {
        Ok(Self {
            deriver: FeatureDeriver::new(config)?,
        })
    }

    /// Outer-join all series on date and forward-fill the auxiliaries.
    ///
    /// Only dates on which the target traded are returned; the target itself is
    /// never filled.
    pub fn align(primary: &PriceSeries, auxiliaries: &[PriceSeries]) -> Result<Vec<AlignedRow>> {
        check_names(primary, auxiliaries)?;

        let width = auxiliaries.len();
        let mut by_date: BTreeMap<NaiveDate, (Option<f64>, Vec<Option<f64>>)> = BTreeMap::new();

        for point in primary.points() {
            by_date.entry(point.date).or_insert_with(|| (None, vec![None; width])).0 =
                Some(point.close);
        }
        for (j, series) in auxiliaries.iter().enumerate() {
            for point in series.points() {
                by_date
                    .entry(point.date)
                    .or_insert_with(|| (None, vec![None; width]))
                    .1[j] = Some(point.close);
            }
        }

        let mut last_seen: Vec<Option<f64>> = vec![None; width];
        let mut aligned = Vec::with_capacity(primary.len());
        for (date, (target, aux)) in by_date {
            for (slot, value) in last_seen.iter_mut().zip(aux) {
                if value.is_some() {
                    *slot = value;
                }
            }
            if let Some(close) = target {
                aligned.push(AlignedRow {
                    date,
                    close,
                    regressors: last_seen.clone(),
                });
            }
        }

        Ok(aligned)
    }

    /// Build the model-ready table.
    ///
    /// Rows still missing an indicator or a regressor value are dropped. An empty
    /// primary series yields an empty table; callers must stop there.
    pub fn build(&self, primary: &PriceSeries, auxiliaries: &[PriceSeries]) -> Result<FeatureTable> {
        let names: Vec<String> = auxiliaries.iter().map(|s| s.name().to_string()).collect();

        if primary.is_empty() {
            warn!(series = primary.name(), "primary series is empty");
            check_names(primary, auxiliaries)?;
            return Ok(FeatureTable::empty(names));
        }

        let aligned = Self::align(primary, auxiliaries)?;
        let closes: Vec<f64> = aligned.iter().map(|r| r.close).collect();
        let indicators = self.deriver.derive(&closes)?;

        let rows: Vec<PriceFeatureRow> = aligned
            .into_iter()
            .zip(indicators)
            .filter_map(|(row, ind)| {
                let (sma_short, sma_long, rsi) = ind.complete()?;
                let regressors = row.regressors.into_iter().collect::<Option<Vec<f64>>>()?;
                Some(PriceFeatureRow {
                    date: row.date,
                    close: row.close,
                    sma_short,
                    sma_long,
                    rsi,
                    regressors,
                })
            })
            .collect();

        info!(
            series = primary.name(),
            regressors = names.len(),
            input_rows = closes.len(),
            rows = rows.len(),
            "feature table built"
        );

        FeatureTable::new(names, rows)
    }
}

fn check_names(primary: &PriceSeries, auxiliaries: &[PriceSeries]) -> Result<()> {
    for (i, series) in auxiliaries.iter().enumerate() {
        if series.name() == primary.name() {
            return Err(ForecastError::InvalidParameter(format!(
                "Auxiliary series '{}' has the same name as the target",
                series.name()
            )));
        }
        if auxiliaries[..i].iter().any(|s| s.name() == series.name()) {
            return Err(ForecastError::InvalidParameter(format!(
                "Auxiliary series '{}' supplied twice",
                series.name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    #[test]
    fn test_align_forward_fills_auxiliary_only() {
        // Target trades on days 0, 1, 3; auxiliary on 0, 2, 3
        let gold = PriceSeries::from_pairs("gold", [(day(0), 10.0), (day(1), 11.0), (day(3), 13.0)])
            .unwrap();
        let usd = PriceSeries::from_pairs("usd", [(day(0), 1.0), (day(2), 2.0), (day(3), 3.0)])
            .unwrap();

        let aligned = RegressorSeriesBuilder::align(&gold, &[usd]).unwrap();

        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned[0].regressors, vec![Some(1.0)]);
        // Day 1: auxiliary closed, carried forward from day 0
        assert_eq!(aligned[1].regressors, vec![Some(1.0)]);
        // Day 2 is absent (target closed); its aux value reaches day 3 only if day 3 lacks one
        assert_eq!(aligned[2].date, day(3));
        assert_eq!(aligned[2].regressors, vec![Some(3.0)]);
    }

    #[test]
    fn test_align_carries_value_from_target_holiday() {
        let gold = PriceSeries::from_pairs("gold", [(day(0), 10.0), (day(2), 12.0)]).unwrap();
        let usd = PriceSeries::from_pairs("usd", [(day(1), 5.0)]).unwrap();

        let aligned = RegressorSeriesBuilder::align(&gold, &[usd]).unwrap();
        assert_eq!(aligned[0].regressors, vec![None]);
        assert_eq!(aligned[1].regressors, vec![Some(5.0)]);
    }

    #[test]
    fn test_build_drops_warmup_rows() {
        let gold = PriceSeries::from_pairs(
            "gold",
            (0..120).map(|i| (day(i), 100.0 + (i as f64 * 0.2).sin() * 5.0 + i as f64 * 0.1)),
        )
        .unwrap();

        let table = RegressorSeriesBuilder::default().build(&gold, &[]).unwrap();
        assert_eq!(table.len(), 120 - 49);
        assert_eq!(table.rows()[0].date, day(49));
        assert!(table.regressor_names().is_empty());
    }

    #[test]
    fn test_build_empty_primary() {
        let gold = PriceSeries::new("gold", Vec::new()).unwrap();
        let usd = PriceSeries::from_pairs("usd", [(day(0), 1.0)]).unwrap();

        let table = RegressorSeriesBuilder::default().build(&gold, &[usd]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.regressor_names(), &["usd".to_string()]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let gold = PriceSeries::from_pairs("gold", [(day(0), 1.0)]).unwrap();
        let a = PriceSeries::from_pairs("usd", [(day(0), 1.0)]).unwrap();
        let b = PriceSeries::from_pairs("usd", [(day(0), 2.0)]).unwrap();
        let same = PriceSeries::from_pairs("gold", [(day(0), 2.0)]).unwrap();

        assert!(RegressorSeriesBuilder::align(&gold, &[a, b]).is_err());
        assert!(RegressorSeriesBuilder::align(&gold, &[same]).is_err());
    }

    #[test]
    fn test_table_validation_and_slice() {
        let row = |d: i64| PriceFeatureRow {
            date: day(d),
            close: 1.0,
            sma_short: 1.0,
            sma_long: 1.0,
            rsi: 50.0,
            regressors: vec![2.0],
        };

        let table = FeatureTable::new(vec!["usd".into()], vec![row(0), row(1), row(2)]).unwrap();
        assert_eq!(table.slice(1, 3).unwrap().dates(), vec![day(1), day(2)]);
        assert!(table.slice(2, 4).is_err());
        assert_eq!(table.regressor_column("usd"), Some(vec![2.0, 2.0, 2.0]));
        assert_eq!(table.regressor_column("yield"), None);

        assert!(FeatureTable::new(vec!["usd".into()], vec![row(1), row(0)]).is_err());
        assert!(FeatureTable::new(vec![], vec![row(0)]).is_err());
    }

    #[test]
    fn test_to_dataframe_shape() {
        let row = PriceFeatureRow {
            date: day(0),
            close: 1.0,
            sma_short: 1.0,
            sma_long: 1.0,
            rsi: 50.0,
            regressors: vec![2.0, 3.0],
        };
        let table = FeatureTable::new(vec!["usd".into(), "yield".into()], vec![row]).unwrap();
        let df = table.to_dataframe().unwrap();

        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 7);
    }
}
