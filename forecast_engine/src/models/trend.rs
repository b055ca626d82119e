//! Piecewise-linear trend: time scaling, changepoint placement and the
//! uncertainty added by changepoints that may occur after the training span.

use chrono::NaiveDate;

/// Maps dates onto scaled time, 0 at the first training date and 1 at the last
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    start: NaiveDate,
    span_days: f64,
}

impl TimeScale {
    /// Create a scale over `[start, end]`; a zero-length span counts as one day
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let span_days = (end - start).num_days().max(1) as f64;
        Self { start, span_days }
    }

    /// Scaled time of a date; dates after the training span map above 1
    pub fn scale(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    /// First training date
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Days between the first and last training date
    pub fn span_days(&self) -> f64 {
        self.span_days
    }
}

/// Scaled times of the potential changepoints.
///
/// Changepoints sit on evenly spaced rows of the first `changepoint_range`
/// share of history. Fewer rows than requested shrink the count; the first row
/// is never a changepoint.
pub fn changepoint_locations(t: &[f64], n_changepoints: usize, changepoint_range: f64) -> Vec<f64> {
    let hist_size = ((t.len() as f64) * changepoint_range).floor() as usize;
    let hist_size = hist_size.min(t.len());
    let count = n_changepoints.min(hist_size.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }

    let last = (hist_size - 1) as f64;
    (1..=count)
        .map(|i| {
            let row = (i as f64 * last / count as f64).round() as usize;
            t[row]
        })
        .collect()
}

/// Hinge features `max(t - s, 0)` for every changepoint `s`
pub fn hinges(t: f64, changepoints: &[f64]) -> impl Iterator<Item = f64> + '_ {
    changepoints.iter().map(move |&s| (t - s).max(0.0))
}

/// Variance of the trend at scaled time `t` due to unseen future changepoints.
///
/// Changepoints arrive at `rate` per unit of scaled time after `t = 1` with
/// Laplace(0, `delta_scale`) slope changes. Zero inside the training span.
pub fn trend_variance(t: f64, rate: f64, delta_scale: f64) -> f64 {
    if t <= 1.0 || rate <= 0.0 {
        return 0.0;
    }
    let ahead = t - 1.0;
    rate * 2.0 * delta_scale.powi(2) * ahead.powi(3) / 3.0
}
