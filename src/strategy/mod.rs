// Trading strategy module
pub mod scalping;

pub use scalping::{ScalpingConfig, ScalpingStrategy};

use crate::models::{Candle, ScalpingSignal};
use crate::Result;

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Generate a trading signal from candles ordered oldest to newest
    fn generate_signal(&self, candles: &[Candle]) -> Result<ScalpingSignal>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required for this strategy
    fn min_candles_required(&self) -> usize;
}
