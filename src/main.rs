use anyhow::Context;
use clap::Parser;
use scalper::api::BybitClient;
use scalper::{Overrides, Settings, TradingBot};

/// Moving-average/RSI scalper for Bybit linear perpetuals.
#[derive(Parser)]
#[command(name = "scalper")]
#[command(about = "Poll Bybit klines and trade a fast/slow MA crossover with an RSI filter", long_about = None)]
struct Cli {
    /// Trading pair, e.g. BTCUSDT
    #[arg(short, long)]
    symbol: Option<String>,

    /// Kline interval (1, 3, 5, 15, 60, D, ...)
    #[arg(short, long)]
    interval: Option<String>,

    /// Quote-currency notional per trade
    #[arg(short, long)]
    quote_size: Option<f64>,

    /// Send real orders instead of paper trading
    #[arg(long)]
    live: bool,

    /// Seconds to wait between cycles
    #[arg(short, long)]
    delay: Option<u32>,

    /// Number of candles fetched per cycle
    #[arg(long)]
    lookback: Option<u32>,

    /// Stop after this many cycles (runs until Ctrl+C otherwise)
    #[arg(long)]
    cycles: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let overrides = Overrides {
        symbol: cli.symbol,
        interval: cli.interval,
        quote_size: cli.quote_size,
        live: cli.live.then_some(true),
        cycle_delay_seconds: cli.delay,
        lookback_candles: cli.lookback,
    };
    let settings = Settings::load(&overrides).context("Failed to load settings")?;

    if settings.live && !settings.has_credentials() {
        tracing::warn!("Live mode without BYBIT_API_KEY/BYBIT_API_SECRET, orders will be rejected");
    }

    let client = BybitClient::new(
        &settings.base_url,
        settings.api_key.clone(),
        settings.api_secret.clone(),
    )
    .context("Failed to build Bybit client")?;

    tracing::info!(
        "🚀 Scalper starting: {} interval={} mode={} quote_size={:.2} delay={}s",
        settings.symbol,
        settings.interval,
        if settings.live { "LIVE" } else { "PAPER" },
        settings.quote_size,
        settings.cycle_delay_seconds
    );

    let mut bot = TradingBot::new(settings, client.clone(), client)
        .context("Invalid trading configuration")?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("⚠️  Received Ctrl+C, shutting down...");
        }
        _ = bot.run(cli.cycles) => {}
    }

    tracing::info!(
        "Final paper balance: {:.2} ({} open positions)",
        bot.account().balance,
        bot.ledger().len()
    );
    Ok(())
}

fn setup_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("scalper={}", level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
