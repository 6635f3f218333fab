use super::Strategy;
use crate::error::ScalperError;
use crate::indicators::{calculate_rsi, calculate_sma};
use crate::models::{Candle, ScalpingSignal, Signal};
use crate::Result;

/// RSI must exceed this to confirm an uptrend
pub const RSI_BUY_THRESHOLD: f64 = 55.0;
/// RSI must be below this to confirm a downtrend
pub const RSI_SELL_THRESHOLD: f64 = 45.0;

/// Indicator windows for the scalping strategy
#[derive(Debug, Clone, PartialEq)]
pub struct ScalpingConfig {
    pub fast_ma_period: usize,
    pub slow_ma_period: usize,
    pub rsi_period: usize,
}

impl Default for ScalpingConfig {
    fn default() -> Self {
        Self {
            fast_ma_period: 9,
            slow_ma_period: 21,
            rsi_period: 14,
        }
    }
}

/// Trend + momentum confirmation strategy
///
/// Buys when the fast SMA is above the slow SMA and RSI confirms upward
/// momentum; sells on the mirrored condition; holds otherwise.
#[derive(Debug, Clone, Default)]
pub struct ScalpingStrategy {
    config: ScalpingConfig,
}

impl ScalpingStrategy {
    pub fn new(config: ScalpingConfig) -> Result<Self> {
        if config.fast_ma_period == 0 || config.slow_ma_period == 0 || config.rsi_period == 0 {
            return Err(ScalperError::InvalidConfig(
                "Indicator windows must be at least 1".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScalpingConfig {
        &self.config
    }

    /// Extract closing prices from candles
    fn extract_prices(candles: &[Candle]) -> Vec<f64> {
        candles.iter().map(|c| c.close).collect()
    }
}

/// Decision rule, first match wins
pub fn classify(fast_ma: f64, slow_ma: f64, rsi: f64) -> Signal {
    if fast_ma > slow_ma && rsi > RSI_BUY_THRESHOLD {
        Signal::Buy
    } else if fast_ma < slow_ma && rsi < RSI_SELL_THRESHOLD {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

impl Strategy for ScalpingStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Result<ScalpingSignal> {
        let prices = Self::extract_prices(candles);

        let fast_ma = calculate_sma(&prices, self.config.fast_ma_period)?;
        let slow_ma = calculate_sma(&prices, self.config.slow_ma_period)?;
        let rsi = calculate_rsi(&prices, self.config.rsi_period)?;

        let signal = classify(fast_ma, slow_ma, rsi);
        tracing::debug!(
            "fast={:.4} slow={:.4} rsi={:.2} -> {}",
            fast_ma,
            slow_ma,
            rsi,
            signal
        );

        Ok(ScalpingSignal {
            signal,
            fast_ma,
            slow_ma,
            rsi,
        })
    }

    fn name(&self) -> &str {
        "ScalpingStrategy"
    }

    fn min_candles_required(&self) -> usize {
        self.config
            .fast_ma_period
            .max(self.config.slow_ma_period)
            .max(self.config.rsi_period + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_candles(prices: &[f64]) -> Vec<Candle> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| Candle {
                timestamp: i as i64 * 60_000,
                open: price,
                high: price,
                low: price,
                close: price,
                volume: 1.0,
            })
            .collect()
    }

    fn small_strategy() -> ScalpingStrategy {
        ScalpingStrategy::new(ScalpingConfig {
            fast_ma_period: 2,
            slow_ma_period: 4,
            rsi_period: 3,
        })
        .unwrap()
    }

    #[test]
    fn test_uptrend_never_sells() {
        let signal = small_strategy()
            .generate_signal(&create_test_candles(&[100.0, 101.0, 102.0, 103.0, 104.0]))
            .unwrap();

        assert_eq!(signal.fast_ma, 103.5);
        assert_eq!(signal.slow_ma, 102.5);
        assert!(matches!(signal.signal, Signal::Buy | Signal::Hold));
        assert_eq!(signal.signal, Signal::Buy);
    }

    #[test]
    fn test_downtrend_never_buys() {
        let signal = small_strategy()
            .generate_signal(&create_test_candles(&[104.0, 103.0, 102.0, 101.0, 100.0]))
            .unwrap();

        assert_eq!(signal.fast_ma, 100.5);
        assert_eq!(signal.slow_ma, 101.5);
        assert!(matches!(signal.signal, Signal::Sell | Signal::Hold));
        assert_eq!(signal.signal, Signal::Sell);
    }

    #[test]
    fn test_strategy_requires_sufficient_data() {
        let strategy = ScalpingStrategy::default();
        let candles = create_test_candles(&[100.0; 20]);

        let result = strategy.generate_signal(&candles);
        assert!(matches!(
            result,
            Err(ScalperError::InsufficientData {
                required: 21,
                available: 20
            })
        ));
    }

    #[test]
    fn test_default_windows() {
        let strategy = ScalpingStrategy::default();
        assert_eq!(strategy.config(), &ScalpingConfig::default());
        assert_eq!(strategy.min_candles_required(), 21);
        assert_eq!(strategy.name(), "ScalpingStrategy");
    }

    #[test]
    fn test_min_candles_covers_rsi() {
        let strategy = ScalpingStrategy::new(ScalpingConfig {
            fast_ma_period: 2,
            slow_ma_period: 4,
            rsi_period: 10,
        })
        .unwrap();
        assert_eq!(strategy.min_candles_required(), 11);
    }

    #[test]
    fn test_zero_window_rejected() {
        let result = ScalpingStrategy::new(ScalpingConfig {
            fast_ma_period: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(ScalperError::InvalidConfig(_))));
    }

    #[test]
    fn test_sideways_market_holds() {
        let prices: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 100.0 } else { 102.0 })
            .collect();
        let signal = ScalpingStrategy::default()
            .generate_signal(&create_test_candles(&prices))
            .unwrap();
        assert_eq!(signal.signal, Signal::Hold);
    }

    #[test]
    fn test_rsi_guards_the_rule() {
        // Trend agrees but momentum does not
        assert_eq!(classify(105.0, 100.0, 55.0), Signal::Hold);
        assert_eq!(classify(105.0, 100.0, 30.0), Signal::Hold);
        assert_eq!(classify(95.0, 100.0, 45.0), Signal::Hold);
        assert_eq!(classify(95.0, 100.0, 80.0), Signal::Hold);

        assert_eq!(classify(105.0, 100.0, 55.01), Signal::Buy);
        assert_eq!(classify(95.0, 100.0, 44.99), Signal::Sell);

        // Equal averages never trade
        assert_eq!(classify(100.0, 100.0, 90.0), Signal::Hold);
        assert_eq!(classify(100.0, 100.0, 10.0), Signal::Hold);
    }

    #[test]
    fn test_guard_property_over_grid() {
        for fast in [90.0, 100.0, 110.0] {
            for step in 0..=100 {
                let rsi = step as f64;
                let signal = classify(fast, 100.0, rsi);
                if rsi <= RSI_BUY_THRESHOLD {
                    assert_ne!(signal, Signal::Buy);
                }
                if rsi >= RSI_SELL_THRESHOLD {
                    assert_ne!(signal, Signal::Sell);
                }
            }
        }
    }
}
