use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use super::{CandleSource, OrderAck, OrderGateway};
use crate::error::ScalperError;
use crate::models::{Candle, Side};
use crate::Result;

// Bybit v5 REST
// Docs: https://bybit-exchange.github.io/docs/v5/intro
pub const BYBIT_API_BASE: &str = "https://api.bybit.com";
const CATEGORY: &str = "linear";
const RECV_WINDOW: &str = "5000";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const RATE_LIMIT_RPS: u32 = 10;
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 1000;

type HmacSha256 = Hmac<Sha256>;

type BybitRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Clone)]
struct Credentials {
    api_key: String,
    api_secret: String,
}

/// Client for the Bybit v5 market and order endpoints
///
/// Cloneable; clones share the rate limiter.
#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
    rate_limiter: Arc<BybitRateLimiter>,
    max_attempts: u32,
    retry_base_delay: Duration,
}

// ============== Wire Types ==============

#[derive(Debug, Deserialize)]
struct KlineResult {
    #[serde(default)]
    list: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderRequest<'a> {
    category: &'a str,
    symbol: &'a str,
    side: &'a str,
    order_type: &'a str,
    qty: String,
    time_in_force: &'a str,
}

// ============== Implementation ==============

impl BybitClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        api_secret: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let credentials = match (api_key, api_secret) {
            (Some(api_key), Some(api_secret)) if !api_key.is_empty() && !api_secret.is_empty() => {
                Some(Credentials {
                    api_key,
                    api_secret,
                })
            }
            _ => None,
        };

        let quota =
            Quota::per_second(NonZeroU32::new(RATE_LIMIT_RPS).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            max_attempts: MAX_ATTEMPTS,
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        })
    }

    /// Override the retry policy for idempotent requests
    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_base_delay = base_delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Fetch the latest `limit` klines, returned oldest first
    /// Endpoint: GET /v5/market/kline
    pub async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/v5/market/kline", self.base_url);
        let limit = limit.to_string();
        let query = [
            ("category", CATEGORY),
            ("symbol", symbol),
            ("interval", interval),
            ("limit", limit.as_str()),
        ];

        tracing::debug!("Fetching {} klines for {} ({})", limit, symbol, interval);

        let body = self.get_with_retry(&url, &query).await?;
        let payload = check_response(&body)?;

        let result: KlineResult = serde_json::from_value(payload["result"].clone())
            .map_err(|e| ScalperError::Api(format!("Malformed kline result: {}", e)))?;

        // Exchange lists newest first
        let mut candles = result
            .list
            .iter()
            .map(|row| Candle::from_row(row.as_slice()))
            .collect::<Result<Vec<_>>>()?;
        candles.reverse();

        Ok(candles)
    }

    /// Submit a market IOC order
    /// Endpoint: POST /v5/order/create
    pub async fn create_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
    ) -> Result<OrderAck> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ScalperError::AuthenticationRequired)?;

        let request = OrderRequest {
            category: CATEGORY,
            symbol,
            side: side.as_str(),
            order_type: "Market",
            qty: quantity.to_string(),
            time_in_force: "IOC",
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| ScalperError::Api(format!("Failed to encode order: {}", e)))?;

        let timestamp = Utc::now().timestamp_millis().to_string();
        let signature = sign(
            &credentials.api_secret,
            &signature_payload(&timestamp, &credentials.api_key, RECV_WINDOW, &body),
        )?;

        tracing::info!("Placing {} {} {} @ MARKET", side, request.qty, symbol);

        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .post(format!("{}/v5/order/create", self.base_url))
            .header(CONTENT_TYPE, "application/json")
            .header("X-BAPI-API-KEY", &credentials.api_key)
            .header("X-BAPI-TIMESTAMP", &timestamp)
            .header("X-BAPI-RECV-WINDOW", RECV_WINDOW)
            .header("X-BAPI-SIGN", signature)
            .body(body)
            .send()
            .await?;

        let text = read_body(response).await?;
        let payload = check_response(&text)?;

        let ack: OrderAck = serde_json::from_value(payload["result"].clone())
            .map_err(|e| ScalperError::Api(format!("Malformed order result: {}", e)))?;

        tracing::info!("Order accepted: id={}", ack.order_id);
        Ok(ack)
    }

    /// GET with exponential backoff on network errors and 5xx
    async fn get_with_retry(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.rate_limiter.until_ready().await;

            match self.client.get(url).query(query).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_server_error() && attempt < self.max_attempts {
                        let backoff = self.backoff(attempt);
                        tracing::warn!(
                            "Server error {} from Bybit, retrying in {:?} (attempt {}/{})",
                            status,
                            backoff,
                            attempt,
                            self.max_attempts
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return read_body(response).await;
                }
                Err(e) if attempt < self.max_attempts => {
                    let backoff = self.backoff(attempt);
                    tracing::warn!(
                        "Network error: {}, retrying in {:?} (attempt {}/{})",
                        e,
                        backoff,
                        attempt,
                        self.max_attempts
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl CandleSource for BybitClient {
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        self.fetch_klines(symbol, interval, limit).await
    }
}

impl OrderGateway for BybitClient {
    async fn place_order(&self, symbol: &str, side: Side, quantity: f64) -> Result<OrderAck> {
        self.create_market_order(symbol, side, quantity).await
    }
}

/// String covered by the request signature
fn signature_payload(timestamp: &str, api_key: &str, recv_window: &str, payload: &str) -> String {
    format!("{}{}{}{}", timestamp, api_key, recv_window, payload)
}

/// Hex HMAC-SHA256 of `message` under `secret`
fn sign(secret: &str, message: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ScalperError::InvalidConfig(format!("Bad API secret: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Body of a successful response; an error status becomes `Transport`
async fn read_body(response: Response) -> Result<String> {
    if let Err(e) = response.error_for_status_ref().map(|_| ()) {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Bybit HTTP {}: {}", e.status().map_or(0, |s| s.as_u16()), body);
        return Err(e.into());
    }
    Ok(response.text().await?)
}

/// Reject payloads whose retCode is not 0
fn check_response(body: &str) -> Result<Value> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| ScalperError::Api(format!("Malformed response: {}", e)))?;

    let ok = match payload.get("retCode") {
        Some(Value::Number(code)) => code.as_i64() == Some(0),
        Some(Value::String(code)) => code == "0",
        _ => false,
    };
    if !ok {
        let code = payload.get("retCode").cloned().unwrap_or(Value::Null);
        let msg = payload
            .get("retMsg")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(ScalperError::Api(format!("retCode {}: {}", code, msg)));
    }

    Ok(payload)
}
