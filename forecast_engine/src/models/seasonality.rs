//! Fourier-series seasonal components

use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Period of the weekly component, in days
pub const WEEKLY_PERIOD_DAYS: f64 = 7.0;
/// Period of the yearly component, in days
pub const YEARLY_PERIOD_DAYS: f64 = 365.25;

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A periodic component represented by `order` sine/cosine pairs
#[derive(Debug, Clone, PartialEq)]
pub struct Seasonality {
    name: &'static str,
    period_days: f64,
    order: usize,
}

impl Seasonality {
    /// Weekly component
    pub fn weekly(order: usize) -> Self {
        Self {
            name: "weekly",
            period_days: WEEKLY_PERIOD_DAYS,
            order,
        }
    }

    /// Yearly component
    pub fn yearly(order: usize) -> Self {
        Self {
            name: "yearly",
            period_days: YEARLY_PERIOD_DAYS,
            order,
        }
    }

    /// Component name
    pub fn name(&self) -> &str {
        self.name
    }

    /// Fourier order
    pub fn order(&self) -> usize {
        self.order
    }

    /// Period in days
    pub fn period_days(&self) -> f64 {
        self.period_days
    }

    /// True when a training span of `span_days` covers at least two periods
    pub fn fits_span(&self, span_days: f64) -> bool {
        span_days >= 2.0 * self.period_days
    }

    /// Number of design columns
    pub fn width(&self) -> usize {
        2 * self.order
    }

    /// Append `sin(2πkd/P), cos(2πkd/P)` for k = 1..=order, d = days since 1970-01-01
    pub fn push_terms(&self, date: NaiveDate, out: &mut Vec<f64>) {
        let days = epoch_days(date);
        for k in 1..=self.order {
            let angle = 2.0 * PI * k as f64 * days / self.period_days;
            out.push(angle.sin());
            out.push(angle.cos());
        }
    }
}

fn epoch_days(date: NaiveDate) -> f64 {
    (date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE) as f64
}
