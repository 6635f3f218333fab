use std::time::Duration;

use uuid::Uuid;

use crate::api::{CandleSource, OrderAck, OrderGateway};
use crate::config::Settings;
use crate::error::ScalperError;
use crate::execution::paper_ledger::{Account, ClosedTrade, ExitPriority, PaperLedger};
use crate::models::{ScalpingSignal, Side};
use crate::risk::PositionSizingConfig;
use crate::strategy::{ScalpingStrategy, Strategy};
use crate::Result;

/// Stop distance as a fraction of the entry price (0.15%)
pub const STOP_DISTANCE_FRACTION: f64 = 0.0015;

/// What a cycle did after evaluating the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum CycleAction {
    Hold,
    SkippedZeroSize,
    PaperEntry {
        id: Uuid,
        side: Side,
        size: f64,
        stop_price: f64,
        target_price: f64,
    },
    LiveOrder {
        ack: OrderAck,
        side: Side,
        size: f64,
    },
}

#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub signal: ScalpingSignal,
    pub price: f64,
    pub closed: Vec<ClosedTrade>,
    pub action: CycleAction,
}

/// Stop and target prices for a new position
pub fn exit_levels(side: Side, price: f64, reward_risk_ratio: f64) -> (f64, f64) {
    let stop_gap = price * STOP_DISTANCE_FRACTION;
    let target_gap = stop_gap * reward_risk_ratio;
    match side {
        Side::Buy => (price - stop_gap, price + target_gap),
        Side::Sell => (price + stop_gap, price - target_gap),
    }
}

/// Polling trading loop for a single symbol
///
/// Each cycle fetches candles, generates a signal, settles the paper ledger
/// against the latest close and, on buy/sell, sizes and executes a new
/// position. Cycles never overlap.
pub struct TradingBot<M, O> {
    settings: Settings,
    market: M,
    orders: O,
    strategy: Box<dyn Strategy>,
    sizing: PositionSizingConfig,
    ledger: PaperLedger,
    account: Account,
}

impl<M: CandleSource, O: OrderGateway> TradingBot<M, O> {
    pub fn new(settings: Settings, market: M, orders: O) -> Result<Self> {
        Self::with_strategy(settings, market, orders, Box::new(ScalpingStrategy::default()))
    }

    pub fn with_strategy(
        settings: Settings,
        market: M,
        orders: O,
        strategy: Box<dyn Strategy>,
    ) -> Result<Self> {
        settings.validate(strategy.min_candles_required())?;
        tracing::info!(
            "Strategy: {} (needs {} candles, fetching {})",
            strategy.name(),
            strategy.min_candles_required(),
            settings.lookback_candles
        );
        let sizing = settings.sizing_config();
        let account = Account::new(settings.paper_balance);

        Ok(Self {
            settings,
            market,
            orders,
            strategy,
            sizing,
            ledger: PaperLedger::new(),
            account,
        })
    }

    /// Replace the exit tie-break policy; open positions are kept
    pub fn with_exit_priority(mut self, priority: ExitPriority) -> Self {
        self.ledger.set_priority(priority);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn ledger(&self) -> &PaperLedger {
        &self.ledger
    }

    /// Run one fetch → decide → settle → maybe execute cycle
    pub async fn run_once(&mut self) -> Result<CycleOutcome> {
        let candles = self
            .market
            .fetch_candles(
                &self.settings.symbol,
                &self.settings.interval,
                self.settings.lookback_candles,
            )
            .await?;

        let signal = self.strategy.generate_signal(&candles)?;
        let price = candles
            .last()
            .map(|c| c.close)
            .ok_or(ScalperError::InsufficientData {
                required: 1,
                available: 0,
            })?;

        let closed = self.ledger.evaluate(price, &mut self.account);

        tracing::info!(
            "Signal: {} | close={:.2} | fast={:.2} slow={:.2} RSI={:.2} | balance={:.2}",
            signal.signal,
            price,
            signal.fast_ma,
            signal.slow_ma,
            signal.rsi,
            self.account.balance
        );

        let action = match signal.signal.side() {
            Some(side) => self.execute(side, price).await?,
            None => CycleAction::Hold,
        };

        tracing::debug!("  Open paper positions: {}", self.ledger.len());

        Ok(CycleOutcome {
            signal,
            price,
            closed,
            action,
        })
    }

    async fn execute(&mut self, side: Side, price: f64) -> Result<CycleAction> {
        let size = self.sizing.order_size(price, self.account.balance)?;
        if size <= 0.0 {
            tracing::info!("Order size zero, skipping.");
            return Ok(CycleAction::SkippedZeroSize);
        }

        let (stop_price, target_price) =
            exit_levels(side, price, self.settings.target_reward_risk_ratio);

        if self.settings.live {
            let ack = self
                .orders
                .place_order(&self.settings.symbol, side, size)
                .await?;
            Ok(CycleAction::LiveOrder { ack, side, size })
        } else {
            let id = self
                .ledger
                .enter(side, price, size, stop_price, target_price);
            Ok(CycleAction::PaperEntry {
                id,
                side,
                size,
                stop_price,
                target_price,
            })
        }
    }

    /// Run cycles until `max_cycles` is reached (forever when `None`)
    ///
    /// A failed cycle is logged and the loop carries on after the delay.
    pub async fn run(&mut self, max_cycles: Option<u64>) {
        let delay = Duration::from_secs(self.settings.cycle_delay_seconds);
        let mut cycles = 0u64;

        loop {
            cycles += 1;
            if let Err(e) = self.run_once().await {
                if e.is_operational() {
                    tracing::error!("Cycle failed: {}", e);
                } else {
                    tracing::error!("Cycle aborted: {}", e);
                }
            }

            if max_cycles.is_some_and(|max| cycles >= max) {
                tracing::info!("Completed {} cycles", cycles);
                return;
            }
            tokio::time::sleep(delay).await;
        }
    }
}
