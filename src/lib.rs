//! # Gamma Scalper
//!
//! A simulator for a gamma-scalping options strategy: one long at-the-money
//! straddle hedged with a single perpetual future, rebalanced as the
//! underlying moves, with daily profit/loss accounting over a historical
//! price series.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `data`: Historical price-table loading and expiry calendar arithmetic
//! - `engine`: Position lifecycle, delta hedging, and PnL accounting
//! - `sim`: The day-by-day driving loop and run-level metrics

pub mod config;
pub mod data;
pub mod engine;
pub mod sim;

pub use config::SimulationConfig;
pub use engine::{EngineError, GammaScalpingEngine};
