use thiserror::Error;

/// Errors produced by the trading core and the exchange client
#[derive(Debug, Error)]
pub enum ScalperError {
    /// Too few closes for the requested indicator window
    #[error("Insufficient data: {available} values, need {required}")]
    InsufficientData { required: usize, available: usize },

    /// Non-positive (or NaN) price handed to position sizing
    #[error("Invalid price: {0} (must be positive)")]
    InvalidPrice(f64),

    /// Network or HTTP-layer failure talking to the exchange
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The exchange answered but reported a logical failure
    #[error("API error: {0}")]
    Api(String),

    /// Live order attempted without API credentials
    #[error("Live trading requires BYBIT_API_KEY and BYBIT_API_SECRET")]
    AuthenticationRequired,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ScalperError {
    /// True for faults caused by the outside world rather than by bad input
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            ScalperError::Transport(_) | ScalperError::Api(_) | ScalperError::AuthenticationRequired
        )
    }
}
