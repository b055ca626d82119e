//! Raw daily price series and their CSV loader

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading day
    pub date: NaiveDate,
    /// Close price
    pub close: f64,
}

impl PricePoint {
    /// Create a new price point
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Daily closes of one instrument, sorted by date with at most one point per day
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    name: String,
    points: Vec<PricePoint>,
}

/// CSV row as exported by common market-data tools
#[derive(Debug, Deserialize)]
struct RawPriceRecord {
    #[serde(alias = "Date", alias = "ds", alias = "timestamp")]
    date: String,
    #[serde(alias = "Close", alias = "price", alias = "Price", alias = "y")]
    close: Option<f64>,
}

impl PriceSeries {
    /// Create a series from unordered points.
    ///
    /// Points are sorted by date; when a date repeats the later point wins.
    /// Non-finite closes are treated as missing and dropped.
    pub fn new(name: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Series name must not be empty".to_string(),
            ));
        }

        let mut points: Vec<PricePoint> = points
            .into_iter()
            .filter(|p| p.close.is_finite())
            .collect();
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Ok(Self {
            name,
            points: deduped,
        })
    }

    /// Create a series from `(date, close)` pairs
    pub fn from_pairs<I>(name: impl Into<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let points = pairs
            .into_iter()
            .map(|(date, close)| PricePoint::new(date, close))
            .collect();
        Self::new(name, points)
    }

    /// Load a series from a CSV file with `date` and `close` columns
    pub fn from_csv<P: AsRef<Path>>(name: impl Into<String>, path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "reading price CSV");
        Self::from_reader(name, file)
    }

    /// Load a series from any CSV source.
    ///
    /// Dates may carry a time or timezone suffix (`2024-01-02 00:00:00-05:00`);
    /// only the calendar day is kept. Rows with an empty close are skipped.
    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut points = Vec::new();
        for record in csv_reader.deserialize::<RawPriceRecord>() {
            let record = record?;
            let date = parse_date(&record.date)?;
            if let Some(close) = record.close {
                points.push(PricePoint::new(date, close));
            }
        }

        Self::new(name, points)
    }

    /// Series name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All points in date order
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Close prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Most recent point
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

/// Parse the calendar-day prefix of a date or datetime string
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| ForecastError::DataError(format!("Invalid date '{}': {}", raw, e)))
}
