use config::{Config, Environment, Map};
use serde::{Deserialize, Serialize};

use crate::api::bybit::BYBIT_API_BASE;
use crate::error::ScalperError;
use crate::risk::PositionSizingConfig;
use crate::Result;

/// Largest kline page the exchange serves in one request
pub const MAX_LOOKBACK_CANDLES: usize = 1000;

/// Runtime settings for the bot
///
/// Layering, lowest to highest: built-in defaults, `SCALPER_*` environment
/// variables, `BYBIT_API_KEY`/`BYBIT_API_SECRET`/`BYBIT_BASE_URL`,
/// command-line overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub symbol: String,
    pub interval: String, // Exchange kline interval, e.g. "1", "5", "60", "D"
    pub lookback_candles: usize,
    pub quote_size: f64,
    pub live: bool,
    pub risk_per_trade: f64,
    pub max_position_fraction: f64,
    pub target_reward_risk_ratio: f64,
    pub cycle_delay_seconds: u64,
    pub paper_balance: f64,
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: "1".to_string(),
            lookback_candles: 200,
            quote_size: 100.0,
            live: false,
            risk_per_trade: 0.01,
            max_position_fraction: 0.2,
            target_reward_risk_ratio: 1.5,
            cycle_delay_seconds: 15,
            paper_balance: 1000.0,
            base_url: BYBIT_API_BASE.to_string(),
            api_key: None,
            api_secret: None,
        }
    }
}

/// Values supplied on the command line; `None` leaves the lower layer in place
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub quote_size: Option<f64>,
    pub live: Option<bool>,
    pub cycle_delay_seconds: Option<u32>,
    pub lookback_candles: Option<u32>,
}

impl Settings {
    /// Load settings from the process environment plus `overrides`
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(overrides, None)
    }

    /// Load settings from an explicit environment map (`None` = process env)
    pub fn load_with_env(overrides: &Overrides, env: Option<Map<String, String>>) -> Result<Self> {
        let defaults = Settings::default();

        // Only these BYBIT_* variables are read; trading options stay under SCALPER_*
        let lookup = |key: &str| match &env {
            Some(map) => map.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        let api_key = lookup("BYBIT_API_KEY");
        let api_secret = lookup("BYBIT_API_SECRET");
        let base_url = lookup("BYBIT_BASE_URL");

        let config = Config::builder()
            .set_default("symbol", defaults.symbol)?
            .set_default("interval", defaults.interval)?
            .set_default("lookback_candles", defaults.lookback_candles as i64)?
            .set_default("quote_size", defaults.quote_size)?
            .set_default("live", defaults.live)?
            .set_default("risk_per_trade", defaults.risk_per_trade)?
            .set_default("max_position_fraction", defaults.max_position_fraction)?
            .set_default("target_reward_risk_ratio", defaults.target_reward_risk_ratio)?
            .set_default("cycle_delay_seconds", defaults.cycle_delay_seconds as i64)?
            .set_default("paper_balance", defaults.paper_balance)?
            .set_default("base_url", defaults.base_url)?
            .add_source(
                Environment::with_prefix("SCALPER")
                    .try_parsing(true)
                    .source(env),
            )
            .set_override_option("api_key", api_key)?
            .set_override_option("api_secret", api_secret)?
            .set_override_option("base_url", base_url)?
            .set_override_option("symbol", overrides.symbol.clone())?
            .set_override_option("interval", overrides.interval.clone())?
            .set_override_option("quote_size", overrides.quote_size)?
            .set_override_option("live", overrides.live)?
            .set_override_option(
                "cycle_delay_seconds",
                overrides.cycle_delay_seconds.map(i64::from),
            )?
            .set_override_option(
                "lookback_candles",
                overrides.lookback_candles.map(i64::from),
            )?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Position sizing limits derived from these settings
    pub fn sizing_config(&self) -> PositionSizingConfig {
        PositionSizingConfig {
            quote_size: self.quote_size,
            max_position_fraction: self.max_position_fraction,
            risk_per_trade: self.risk_per_trade,
        }
    }

    /// Check the settings can drive a strategy needing `min_candles` candles
    pub fn validate(&self, min_candles: usize) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol must not be empty"));
        }
        if self.interval.trim().is_empty() {
            return Err(invalid("interval must not be empty"));
        }
        if self.lookback_candles < min_candles {
            return Err(invalid(format!(
                "lookback_candles {} is below the {} candles the strategy needs",
                self.lookback_candles, min_candles
            )));
        }
        if self.lookback_candles > MAX_LOOKBACK_CANDLES {
            return Err(invalid(format!(
                "lookback_candles {} exceeds the exchange limit of {}",
                self.lookback_candles, MAX_LOOKBACK_CANDLES
            )));
        }
        if !self.target_reward_risk_ratio.is_finite() || self.target_reward_risk_ratio <= 0.0 {
            return Err(invalid(format!(
                "target_reward_risk_ratio must be positive, got {}",
                self.target_reward_risk_ratio
            )));
        }
        if !self.paper_balance.is_finite() || self.paper_balance < 0.0 {
            return Err(invalid(format!(
                "paper_balance must be zero or positive, got {}",
                self.paper_balance
            )));
        }
        if self.cycle_delay_seconds == 0 {
            return Err(invalid("cycle_delay_seconds must be at least 1"));
        }
        self.sizing_config().validate()
    }

    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.api_key) && present(&self.api_secret)
    }
}

fn invalid(msg: impl Into<String>) -> ScalperError {
    ScalperError::InvalidConfig(msg.into())
}

impl From<config::ConfigError> for ScalperError {
    fn from(err: config::ConfigError) -> Self {
        ScalperError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(&Overrides::default(), env(&[])).unwrap();

        assert_eq!(settings.symbol, "BTCUSDT");
        assert_eq!(settings.interval, "1");
        assert_eq!(settings.lookback_candles, 200);
        assert_eq!(settings.quote_size, 100.0);
        assert!(!settings.live);
        assert_eq!(settings.risk_per_trade, 0.01);
        assert_eq!(settings.max_position_fraction, 0.2);
        assert_eq!(settings.target_reward_risk_ratio, 1.5);
        assert_eq!(settings.cycle_delay_seconds, 15);
        assert_eq!(settings.paper_balance, 1000.0);
        assert_eq!(settings.base_url, "https://api.bybit.com");
        assert!(settings.api_key.is_none());
        assert!(!settings.has_credentials());
        assert!(settings.validate(21).is_ok());
    }

    #[test]
    fn test_environment_layer() {
        let settings = Settings::load_with_env(
            &Overrides::default(),
            env(&[
                ("SCALPER_SYMBOL", "ETHUSDT"),
                ("SCALPER_QUOTE_SIZE", "250.5"),
                ("SCALPER_LIVE", "true"),
                ("SCALPER_CYCLE_DELAY_SECONDS", "30"),
                ("BYBIT_API_KEY", "key"),
                ("BYBIT_API_SECRET", "secret"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.symbol, "ETHUSDT");
        assert_eq!(settings.quote_size, 250.5);
        assert!(settings.live);
        assert_eq!(settings.cycle_delay_seconds, 30);
        assert_eq!(settings.api_key.as_deref(), Some("key"));
        assert!(settings.has_credentials());
    }

    #[test]
    fn test_exchange_variables_limited_to_credentials() {
        let settings = Settings::load_with_env(
            &Overrides::default(),
            env(&[
                ("BYBIT_SYMBOL", "DOGEUSDT"),
                ("BYBIT_LIVE", "true"),
                ("BYBIT_BASE_URL", "https://api-testnet.bybit.com"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.symbol, "BTCUSDT");
        assert!(!settings.live);
        assert_eq!(settings.base_url, "https://api-testnet.bybit.com");
    }

    #[test]
    fn test_overrides_beat_environment() {
        let overrides = Overrides {
            symbol: Some("SOLUSDT".to_string()),
            quote_size: Some(42.0),
            lookback_candles: Some(50),
            ..Default::default()
        };
        let settings = Settings::load_with_env(
            &overrides,
            env(&[("SCALPER_SYMBOL", "ETHUSDT"), ("SCALPER_INTERVAL", "5")]),
        )
        .unwrap();

        assert_eq!(settings.symbol, "SOLUSDT");
        assert_eq!(settings.interval, "5");
        assert_eq!(settings.quote_size, 42.0);
        assert_eq!(settings.lookback_candles, 50);
    }

    #[test]
    fn test_validate_lookback() {
        let settings = Settings {
            lookback_candles: 20,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(21),
            Err(ScalperError::InvalidConfig(_))
        ));

        let settings = Settings {
            lookback_candles: 5000,
            ..Default::default()
        };
        assert!(settings.validate(21).is_err());
    }

    #[test]
    fn test_validate_limits() {
        let bad = [
            Settings {
                symbol: " ".to_string(),
                ..Default::default()
            },
            Settings {
                quote_size: -1.0,
                ..Default::default()
            },
            Settings {
                risk_per_trade: 1.5,
                ..Default::default()
            },
            Settings {
                max_position_fraction: 0.0,
                ..Default::default()
            },
            Settings {
                target_reward_risk_ratio: 0.0,
                ..Default::default()
            },
            Settings {
                paper_balance: f64::NAN,
                ..Default::default()
            },
            Settings {
                cycle_delay_seconds: 0,
                ..Default::default()
            },
        ];
        for settings in bad {
            assert!(settings.validate(21).is_err(), "{:?}", settings);
        }

        let zero_balance = Settings {
            paper_balance: 0.0,
            ..Default::default()
        };
        assert!(zero_balance.validate(21).is_ok());
    }

    #[test]
    fn test_sizing_config_mirrors_settings() {
        let settings = Settings::default();
        let sizing = settings.sizing_config();
        assert_eq!(sizing.quote_size, 100.0);
        assert_eq!(sizing.max_position_fraction, 0.2);
        assert_eq!(sizing.risk_per_trade, 0.01);
    }
}
