//! Position-lifecycle and delta-hedging state machine.
//!
//! This module provides:
//! - Black-Scholes delta model (`delta`)
//! - Single-position ledger with open/close mutations (`ledger`)
//! - Threshold-driven perp hedge controller (`hedge`)
//! - Mark-to-market snapshot accounting (`pnl`)
//! - The composed engine driving one simulation run
//!
//! # Example
//!
//! ```rust,ignore
//! use gamma_scalper::engine::GammaScalpingEngine;
//!
//! let mut engine = GammaScalpingEngine::new(dec!(100000), 2)?;
//! engine.open(&rows[0])?;
//! let exposure = engine.hedge(&rows[1], rows[1].date)?;
//! let snapshot = engine.snapshot(&rows[1], &exposure)?;
//! let realized = engine.close(rows.last().unwrap())?;
//! ```

mod delta;
mod error;
mod hedge;
mod ledger;
mod pnl;

pub use delta::{delta, OptionType};
pub use error::EngineError;
pub use hedge::{DeltaExposure, HedgeController};
pub use ledger::{CloseOutcome, Position, PositionLedger};
pub use pnl::PortfolioSnapshot;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::data::MarketRow;

/// One gamma-scalping run: a single straddle hedged with one perp, tracked
/// day by day.
///
/// The engine exclusively owns its cash balance, cumulative realized PnL,
/// and the position ledger; the driving loop owns when to call what.
#[derive(Debug)]
pub struct GammaScalpingEngine {
    cash: Decimal,
    realized_pnl: Decimal,
    initial_capital: Decimal,
    hedge_freq_days: u32,
    ledger: PositionLedger,
    controller: HedgeController,
    last_row_date: Option<NaiveDate>,
}

impl GammaScalpingEngine {
    /// Create an engine with the given starting capital.
    ///
    /// `hedge_freq_days` is carried for the driving loop's calendar
    /// throttling; the rebalancing decision itself is threshold-driven.
    pub fn new(initial_capital: Decimal, hedge_freq_days: u32) -> Result<Self, EngineError> {
        if initial_capital <= Decimal::ZERO {
            return Err(EngineError::NonPositiveCapital(initial_capital));
        }
        if hedge_freq_days == 0 {
            return Err(EngineError::ZeroHedgeFrequency);
        }

        Ok(Self {
            cash: initial_capital,
            realized_pnl: Decimal::ZERO,
            initial_capital,
            hedge_freq_days,
            ledger: PositionLedger::new(),
            controller: HedgeController::default(),
            last_row_date: None,
        })
    }

    /// Open an at-the-money straddle deploying the full cash balance.
    pub fn open(&mut self, row: &MarketRow) -> Result<(), EngineError> {
        self.ensure_ascending(row.date)?;
        let qty = self.ledger.open(row, self.cash)?;
        self.cash = Decimal::ZERO;
        self.last_row_date = Some(row.date);

        info!(
            date = %row.date,
            %qty,
            strike = %row.spot_price,
            expiry = %row.expiry,
            "opened straddle"
        );
        Ok(())
    }

    /// Rebalance the perp hedge for `row`, returning the pre-adjustment
    /// exposure for reporting.
    pub fn hedge(
        &mut self,
        row: &MarketRow,
        today: NaiveDate,
    ) -> Result<DeltaExposure, EngineError> {
        self.ensure_ascending(row.date)?;
        let position = self
            .ledger
            .position_mut()
            .ok_or(EngineError::NoOpenPosition("hedge"))?;

        let exposure = self.controller.rebalance(position, row, today)?;
        self.last_row_date = Some(row.date);
        Ok(exposure)
    }

    /// Compute exposure for `row` without trading. Lets the driving loop
    /// snapshot on days it throttles hedging away.
    pub fn exposure(&self, row: &MarketRow) -> Result<DeltaExposure, EngineError> {
        let position = self
            .ledger
            .position()
            .ok_or(EngineError::NoOpenPosition("exposure"))?;
        self.controller.exposure(position, row)
    }

    /// Close the open position, fold proceeds back into cash, and return the
    /// realized amount for this close.
    pub fn close(&mut self, row: &MarketRow) -> Result<Decimal, EngineError> {
        self.ensure_ascending(row.date)?;
        let outcome = self.ledger.close(row)?;
        self.cash += outcome.proceeds;
        self.realized_pnl += outcome.realized;
        self.last_row_date = Some(row.date);

        info!(
            date = %row.date,
            realized = %outcome.realized,
            proceeds = %outcome.proceeds,
            cumulative_realized = %self.realized_pnl,
            "closed position"
        );
        Ok(outcome.realized)
    }

    /// Produce the day's portfolio snapshot from a previously computed
    /// exposure. Read-only.
    pub fn snapshot(
        &self,
        row: &MarketRow,
        exposure: &DeltaExposure,
    ) -> Result<PortfolioSnapshot, EngineError> {
        let position = self
            .ledger
            .position()
            .ok_or(EngineError::NoOpenPosition("snapshot"))?;

        Ok(PortfolioSnapshot::compute(
            row,
            position,
            exposure,
            self.cash,
            self.realized_pnl,
            self.initial_capital,
        ))
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    pub fn hedge_freq_days(&self) -> u32 {
        self.hedge_freq_days
    }

    pub fn position(&self) -> Option<&Position> {
        self.ledger.position()
    }

    pub fn is_open(&self) -> bool {
        self.ledger.is_open()
    }

    /// Rows must be presented in ascending date order; re-processing the same
    /// day is allowed (hedge then snapshot, or hedge then close).
    fn ensure_ascending(&self, date: NaiveDate) -> Result<(), EngineError> {
        match self.last_row_date {
            Some(previous) if date < previous => {
                debug!(%previous, current = %date, "rejecting out-of-order row");
                Err(EngineError::NonMonotonicRow {
                    previous,
                    current: date,
                })
            }
            _ => Ok(()),
        }
    }
}
