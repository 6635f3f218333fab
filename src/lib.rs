// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod risk;
pub mod strategy;

// Re-export commonly used types
pub use config::{Overrides, Settings};
pub use error::ScalperError;
pub use execution::{CycleAction, CycleOutcome, TradingBot};
pub use models::*;
pub use strategy::Strategy;

// Error handling
pub type Result<T> = std::result::Result<T, ScalperError>;
