//! Markdown message bodies for alert delivery

use crate::insight::{InsightRecord, TechnicalSnapshot};
use crate::sentiment::SentimentSnapshot;

/// Full forecast alert
pub fn format_alert_message(insight: &InsightRecord) -> String {
    let mut msg = format!(
        "*Price Forecast & Insights ({} days)*\n\n",
        insight.days_ahead
    );

    msg.push_str("*Trading Signals*\n");
    msg.push_str(&format!("• *Action:* {}\n", insight.action));
    msg.push_str(&format!("• *Trend:* {}\n", insight.tech_trend));
    msg.push_str(&format!("• *Momentum (RSI):* {}\n", insight.rsi_signal));
    if let Some(sentiment) = &insight.sentiment {
        msg.push_str(&format!(
            "• *News Sentiment:* {} (Score: {:.2} based on {} articles)\n",
            sentiment.label, sentiment.score, sentiment.article_count
        ));
    }
    msg.push('\n');

    msg.push_str(&format!("*Current Price:* ${:.2}\n", insight.current_price));
    msg.push_str(&format!(
        "*Short SMA:* ${:.2} | *Long SMA:* ${:.2}\n",
        insight.sma_short, insight.sma_long
    ));
    msg.push_str(&format!("*RSI:* {:.2}\n\n", insight.rsi));

    msg.push_str(&format!("*Forecast for {}*\n", insight.forecast_date));
    msg.push_str(&format!(
        "• *Predicted Price:* ${:.2}\n",
        insight.predicted_price
    ));
    msg.push_str(&format!(
        "• *Lower Bound:* ${:.2} | *Upper Bound:* ${:.2}\n",
        insight.lower_bound, insight.upper_bound
    ));
    msg.push_str(&format!("• *Expected Change:* {:.2}%\n", insight.pct_change));
    msg.push_str(&format!("• *Forecast Trend:* {}\n", insight.forecast_trend));

    if !insight.held_regressors.is_empty() {
        msg.push_str(&format!(
            "\n_Assumes {} stay at their last observed values._\n",
            insight.held_regressors.join(", ")
        ));
    }

    msg
}

/// Short live-signal message, no forecast
pub fn format_price_signal(
    snapshot: &TechnicalSnapshot,
    sentiment: Option<&SentimentSnapshot>,
) -> String {
    let mut msg = String::from("*Real-Time Trading Signals*\n\n");

    msg.push_str(&format!("*Current Price:* ${:.2}\n\n", snapshot.price));
    msg.push_str(&format!("• *Action:* {}\n", snapshot.action));
    msg.push_str(&format!("• *Trend:* {}\n", snapshot.tech_trend));
    msg.push_str(&format!(
        "• *Momentum (RSI):* {} (Value: {:.2})\n",
        snapshot.rsi_signal, snapshot.rsi
    ));
    if let Some(sentiment) = sentiment {
        msg.push_str(&format!(
            "• *News Sentiment:* {} (Score: {:.2})\n",
            sentiment.label, sentiment.score
        ));
    }
    msg.push_str(&format!(
        "\n*Short SMA:* ${:.2} | *Long SMA:* ${:.2}\n",
        snapshot.sma_short, snapshot.sma_long
    ));

    msg
}
