//! Hand-off point to whatever delivers alerts

use crate::error::Result;
use std::path::Path;
use tracing::{info, warn};

/// Receives a rendered alert and an optional chart image
pub trait AlertSink {
    /// Deliver the message; the chart is attached when present
    fn deliver(&self, message: &str, chart: Option<&Path>) -> Result<()>;

    /// Name of the sink
    fn name(&self) -> &str;
}

/// Dry-run sink that writes alerts to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn deliver(&self, message: &str, chart: Option<&Path>) -> Result<()> {
        info!("dry run alert message:\n{}", message);
        if let Some(chart) = chart {
            if chart.exists() {
                info!(chart = %chart.display(), "dry run would attach chart");
            } else {
                warn!(chart = %chart.display(), "chart not found, sending text only");
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
