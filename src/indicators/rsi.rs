use crate::error::ScalperError;
use crate::Result;

/// Calculate Relative Strength Index (RSI)
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions. Gains and losses are plain averages
/// over the last `period` deltas (no Wilder smoothing).
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// A window with no losses saturates at 100.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Result<f64> {
    if period == 0 {
        return Err(ScalperError::InvalidConfig(
            "RSI period must be at least 1".to_string(),
        ));
    }
    if prices.len() < period + 1 {
        return Err(ScalperError::InsufficientData {
            required: period + 1,
            available: prices.len(),
        });
    }

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);

    // Calculate price changes
    for window in prices.windows(2) {
        let change = window[1] - window[0];
        if change >= 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    // Calculate average gain and loss
    let avg_gain: f64 = gains.iter().rev().take(period).sum::<f64>() / period as f64;
    let avg_loss: f64 = losses.iter().rev().take(period).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return Ok(100.0);
    }

    let rs = avg_gain / avg_loss;
    Ok(100.0 - (100.0 / (1.0 + rs)))
}
