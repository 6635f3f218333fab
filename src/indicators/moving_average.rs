use crate::error::ScalperError;
use crate::Result;

/// Calculate Simple Moving Average (SMA) over the last `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Result<f64> {
    if period == 0 {
        return Err(ScalperError::InvalidConfig(
            "SMA period must be at least 1".to_string(),
        ));
    }
    if prices.len() < period {
        return Err(ScalperError::InsufficientData {
            required: period,
            available: prices.len(),
        });
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Ok(sum / period as f64)
}
