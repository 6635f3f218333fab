use serde::{Deserialize, Serialize};

use crate::error::ScalperError;
use crate::Result;

/// Notional cap multiplier on risk-per-trade (roughly three stop distances)
const RISK_CAP_MULTIPLIER: f64 = 3.0;

/// Static limits for turning a price and balance into an order quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionSizingConfig {
    pub quote_size: f64,            // Flat notional per trade
    pub max_position_fraction: f64, // Share of balance per position, (0, 1]
    pub risk_per_trade: f64,        // Share of balance at risk, (0, 1]
}

impl Default for PositionSizingConfig {
    fn default() -> Self {
        Self {
            quote_size: 100.0,
            max_position_fraction: 0.2,
            risk_per_trade: 0.01,
        }
    }
}

impl PositionSizingConfig {
    pub fn new(quote_size: f64, max_position_fraction: f64, risk_per_trade: f64) -> Result<Self> {
        let config = Self {
            quote_size,
            max_position_fraction,
            risk_per_trade,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.quote_size.is_finite() || self.quote_size <= 0.0 {
            return Err(ScalperError::InvalidConfig(format!(
                "quote_size must be a positive number, got {}",
                self.quote_size
            )));
        }
        check_fraction("max_position_fraction", self.max_position_fraction)?;
        check_fraction("risk_per_trade", self.risk_per_trade)?;
        Ok(())
    }

    /// Order quantity for `price` given the current `balance`
    ///
    /// The notional is the smallest of the flat quote size, the balance
    /// fraction cap and three times the per-trade risk budget. Quantity is
    /// rounded to 6 decimals. A non-positive balance yields 0, meaning
    /// "do not trade this cycle".
    pub fn order_size(&self, price: f64, balance: f64) -> Result<f64> {
        order_size(price, balance, self)
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ScalperError::InvalidConfig(format!(
            "{} must be in (0, 1], got {}",
            name, value
        )))
    }
}

/// Calculate order quantity bounded by the configured risk caps
pub fn order_size(price: f64, balance: f64, config: &PositionSizingConfig) -> Result<f64> {
    // Also rejects NaN
    if !(price > 0.0) {
        return Err(ScalperError::InvalidPrice(price));
    }
    if !(balance > 0.0) {
        return Ok(0.0);
    }

    let capped_balance = balance * config.max_position_fraction;
    let risk_cap = balance * config.risk_per_trade * RISK_CAP_MULTIPLIER;
    let notional = config.quote_size.min(capped_balance).min(risk_cap);

    Ok(round_to(notional / price, 6))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
