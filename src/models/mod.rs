use serde::{Deserialize, Serialize};

use crate::error::ScalperError;
use crate::Result;

/// OHLCV candlestick for one kline interval
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: i64, // Interval start, unix ms
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Parse a kline row as returned by the exchange:
    /// `[startMs, open, high, low, close, volume, turnover]`, all strings.
    pub fn from_row<S: AsRef<str>>(row: &[S]) -> Result<Self> {
        if row.len() < 6 {
            return Err(ScalperError::Api(format!(
                "Kline row has {} fields, expected at least 6",
                row.len()
            )));
        }

        let raw_ts = row[0].as_ref();
        let timestamp = raw_ts
            .parse::<i64>()
            .map_err(|e| ScalperError::Api(format!("Bad kline timestamp {:?}: {}", raw_ts, e)))?;

        Ok(Self {
            timestamp,
            open: parse_field(row[1].as_ref())?,
            high: parse_field(row[2].as_ref())?,
            low: parse_field(row[3].as_ref())?,
            close: parse_field(row[4].as_ref())?,
            volume: parse_field(row[5].as_ref())?,
        })
    }
}

fn parse_field(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|e| ScalperError::Api(format!("Bad kline value {:?}: {}", raw, e)))
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Order side for an actionable signal, `None` for hold
    pub fn side(&self) -> Option<Side> {
        match self {
            Signal::Buy => Some(Side::Buy),
            Signal::Sell => Some(Side::Sell),
            Signal::Hold => None,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Hold => "hold",
        };
        f.write_str(s)
    }
}

/// Decision record for one cycle: the signal plus the indicator values behind it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScalpingSignal {
    pub signal: Signal,
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub rsi: f64,
}

/// Position / order direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side string in the exchange's convention
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
