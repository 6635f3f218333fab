// Trading loop and simulated fills
pub mod bot;
pub mod paper_ledger;

pub use bot::{exit_levels, CycleAction, CycleOutcome, TradingBot};
pub use paper_ledger::{Account, ClosedTrade, ExitPriority, ExitReason, PaperLedger, PaperPosition};
