pub mod bybit;

pub use bybit::BybitClient;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::models::{Candle, Side};
use crate::Result;

/// Exchange acknowledgement for a submitted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: String,
    #[serde(default)]
    pub order_link_id: String,
}

/// Anything that can supply recent candles, oldest first
pub trait CandleSource {
    fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Candle>>> + Send;
}

/// Anything that can submit a market order
pub trait OrderGateway {
    fn place_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
    ) -> impl Future<Output = Result<OrderAck>> + Send;
}
