use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Side;

/// Simulated account. Owned by the caller and lent to the ledger on each
/// evaluation so independent runs never share a balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub balance: f64,
}

impl Account {
    pub fn new(balance: f64) -> Self {
        Self { balance }
    }
}

impl Default for Account {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
}

/// Which exit wins when one price satisfies both the stop and the target.
///
/// Only reachable with degenerate levels (e.g. stop above target on a buy).
/// `TargetFirst` books the optimistic outcome; `StopFirst` the pessimistic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExitPriority {
    #[default]
    TargetFirst,
    StopFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperPosition {
    pub id: Uuid,
    pub side: Side,
    pub entry_price: f64,
    pub size: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub opened_at: DateTime<Utc>,
    pub active: bool,
}

impl PaperPosition {
    fn target_hit(&self, price: f64) -> bool {
        match self.side {
            Side::Buy => price >= self.target_price,
            Side::Sell => price <= self.target_price,
        }
    }

    fn stop_hit(&self, price: f64) -> bool {
        match self.side {
            Side::Buy => price <= self.stop_price,
            Side::Sell => price >= self.stop_price,
        }
    }

    /// Exit test for the latest price; deactivates the position on a hit
    pub fn update(&mut self, price: f64, priority: ExitPriority) -> Option<ExitReason> {
        if !self.active {
            return None;
        }

        let reason = match priority {
            ExitPriority::TargetFirst => {
                if self.target_hit(price) {
                    Some(ExitReason::TakeProfit)
                } else if self.stop_hit(price) {
                    Some(ExitReason::StopLoss)
                } else {
                    None
                }
            }
            ExitPriority::StopFirst => {
                if self.stop_hit(price) {
                    Some(ExitReason::StopLoss)
                } else if self.target_hit(price) {
                    Some(ExitReason::TakeProfit)
                } else {
                    None
                }
            }
        };

        if reason.is_some() {
            self.active = false;
        }
        reason
    }
}

/// A position that left the ledger during an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub id: Uuid,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub reason: ExitReason,
    pub pnl: f64, // Signed balance change
}

/// Open simulated positions, each evaluated independently every cycle
#[derive(Debug, Clone, Default)]
pub struct PaperLedger {
    positions: Vec<PaperPosition>,
    priority: ExitPriority,
}

impl PaperLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(priority: ExitPriority) -> Self {
        Self {
            positions: Vec::new(),
            priority,
        }
    }

    pub fn priority(&self) -> ExitPriority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: ExitPriority) {
        self.priority = priority;
    }

    /// Record a new active position. Same-side positions may stack.
    pub fn enter(
        &mut self,
        side: Side,
        entry_price: f64,
        size: f64,
        stop_price: f64,
        target_price: f64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.positions.push(PaperPosition {
            id,
            side,
            entry_price,
            size,
            stop_price,
            target_price,
            opened_at: Utc::now(),
            active: true,
        });

        tracing::info!(
            "📝 Paper {} {:.6} @ {:.2} stop {:.2} target {:.2}",
            side,
            size,
            entry_price,
            stop_price,
            target_price
        );
        id
    }

    /// Check every open position against `price`, settle exits into
    /// `account` and drop the closed ones
    pub fn evaluate(&mut self, price: f64, account: &mut Account) -> Vec<ClosedTrade> {
        let mut closed = Vec::new();

        for position in self.positions.iter_mut() {
            let Some(reason) = position.update(price, self.priority) else {
                continue;
            };

            let move_abs = (price - position.entry_price).abs() * position.size;
            let pnl = match reason {
                ExitReason::TakeProfit => move_abs,
                ExitReason::StopLoss => -move_abs,
            };
            account.balance += pnl;

            match reason {
                ExitReason::TakeProfit => tracing::info!(
                    "✅ Paper {} hit TP at {:.2}. Balance: {:.2}",
                    position.side,
                    price,
                    account.balance
                ),
                ExitReason::StopLoss => tracing::info!(
                    "🛑 Paper {} hit SL at {:.2}. Balance: {:.2}",
                    position.side,
                    price,
                    account.balance
                ),
            }

            closed.push(ClosedTrade {
                id: position.id,
                side: position.side,
                entry_price: position.entry_price,
                exit_price: price,
                size: position.size,
                reason,
                pnl,
            });
        }

        self.positions.retain(|p| p.active);
        closed
    }

    /// Get all open positions
    pub fn open_positions(&self) -> &[PaperPosition] {
        &self.positions
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }
}
