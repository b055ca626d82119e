//! Pre-computed headline sentiment attached to an insight

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Average score above which headlines read as optimistic
pub const OPTIMISTIC_THRESHOLD: f64 = 0.2;
/// Average score below which headlines read as pessimistic
pub const PESSIMISTIC_THRESHOLD: f64 = -0.2;

/// Sentiment summary supplied by an external headline scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    /// Mean compound score in [-1, 1]
    pub score: f64,
    /// Human-readable label
    pub label: String,
    /// Number of headlines scored
    pub article_count: usize,
}

impl SentimentSnapshot {
    /// Build a snapshot with a caller-provided label
    pub fn new(score: f64, label: impl Into<String>, article_count: usize) -> Result<Self> {
        let snapshot = Self {
            score,
            label: label.into(),
            article_count,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Build a snapshot and derive its label from the score
    pub fn from_score(score: f64, article_count: usize) -> Result<Self> {
        let label = if article_count == 0 {
            "No Data"
        } else if score > OPTIMISTIC_THRESHOLD {
            "Optimistic"
        } else if score < PESSIMISTIC_THRESHOLD {
            "Pessimistic"
        } else {
            "Neutral"
        };
        Self::new(score, label, article_count)
    }

    /// Check the score range
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.score) {
            return Err(ForecastError::InvalidParameter(format!(
                "Sentiment score must be in [-1, 1], got {}",
                self.score
            )));
        }
        Ok(())
    }
}
