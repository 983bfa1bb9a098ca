//! Single-position ledger for the straddle and its perp hedge.
//!
//! The ledger holds zero or one position. Lifecycle is `Flat -> Open -> Flat`,
//! with transitions only through [`PositionLedger::open`] and
//! [`PositionLedger::close`]; hedge adjustments mutate an open position in
//! place and never change the lifecycle state.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::data::MarketRow;
use crate::engine::error::EngineError;

/// One long straddle plus its running perpetual-futures hedge.
///
/// Cost fields are cumulative cash outlays, already scaled by quantity;
/// `perp_cost` accrues as an absolute amount regardless of trade direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub call_qty: Decimal,
    pub put_qty: Decimal,
    /// Signed hedge quantity: positive = long perp, negative = short.
    pub perp_qty: Decimal,

    pub call_cost: Decimal,
    pub put_cost: Decimal,
    pub perp_cost: Decimal,

    pub open_date: NaiveDate,
    pub expiry: NaiveDate,
    pub call_iv: Decimal,
    pub put_iv: Decimal,
    pub call_strike: Decimal,
    pub put_strike: Decimal,
    pub spot_at_open: Decimal,
    pub perp_price_at_open: Decimal,

    /// Day of the most recent executed hedge adjustment.
    pub last_hedge_day: Option<NaiveDate>,
}

impl Position {
    /// Total cash ever deployed into the position.
    pub fn cost_basis(&self) -> Decimal {
        self.call_cost + self.put_cost + self.perp_cost
    }

    /// Liquidation value at the row's prices. The perp leg is valued on
    /// absolute quantity, mirroring how its cost accrues.
    pub fn market_value(&self, row: &MarketRow) -> Decimal {
        self.call_qty * row.call_price
            + self.put_qty * row.put_price
            + self.perp_qty.abs() * row.perp_price
    }
}

#[derive(Debug, Clone, Default)]
enum LedgerState {
    #[default]
    Flat,
    Open(Position),
}

/// Proceeds of closing a position.
#[derive(Debug, Clone, Copy)]
pub struct CloseOutcome {
    /// Mark-to-market value returned to cash.
    pub proceeds: Decimal,
    /// Proceeds minus the position's cost basis.
    pub realized: Decimal,
}

/// Owns the zero-or-one open position and its open/close mutations.
#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    state: LedgerState,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<&Position> {
        match &self.state {
            LedgerState::Open(pos) => Some(pos),
            LedgerState::Flat => None,
        }
    }

    pub(crate) fn position_mut(&mut self) -> Option<&mut Position> {
        match &mut self.state {
            LedgerState::Open(pos) => Some(pos),
            LedgerState::Flat => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, LedgerState::Open(_))
    }

    /// Open an at-the-money straddle sized to deploy `cash` in full.
    ///
    /// Both legs get the same quantity `cash / (call_price + put_price)`.
    /// Returns the straddle quantity. Nothing is mutated on failure.
    pub fn open(&mut self, row: &MarketRow, cash: Decimal) -> Result<Decimal, EngineError> {
        if let LedgerState::Open(pos) = &self.state {
            return Err(EngineError::PositionAlreadyOpen(pos.open_date));
        }
        if cash <= Decimal::ZERO {
            return Err(EngineError::OpenFailed(format!(
                "no cash to deploy, balance is {cash}"
            )));
        }
        let unit_cost = row.call_price + row.put_price;
        if unit_cost <= Decimal::ZERO {
            return Err(EngineError::OpenFailed(format!(
                "straddle has no premium on {} (call {}, put {})",
                row.date, row.call_price, row.put_price
            )));
        }

        let qty = cash / unit_cost;
        self.state = LedgerState::Open(Position {
            call_qty: qty,
            put_qty: qty,
            perp_qty: Decimal::ZERO,
            call_cost: qty * row.call_price,
            put_cost: qty * row.put_price,
            perp_cost: Decimal::ZERO,
            open_date: row.date,
            expiry: row.expiry,
            call_iv: row.call_iv,
            put_iv: row.put_iv,
            call_strike: row.spot_price,
            put_strike: row.spot_price,
            spot_at_open: row.spot_price,
            perp_price_at_open: row.perp_price,
            last_hedge_day: None,
        });

        Ok(qty)
    }

    /// Close the open position at the row's prices.
    ///
    /// The ledger goes flat only after the valuation succeeds, so a failure
    /// never leaves a half-closed position behind.
    pub fn close(&mut self, row: &MarketRow) -> Result<CloseOutcome, EngineError> {
        let pos = match &self.state {
            LedgerState::Open(pos) => pos,
            LedgerState::Flat => return Err(EngineError::NoOpenPosition("close")),
        };

        let proceeds = pos.market_value(row);
        let realized = proceeds - pos.cost_basis();
        self.state = LedgerState::Flat;

        Ok(CloseOutcome { proceeds, realized })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::row;
    use rust_decimal_macros::dec;

    #[test]
    fn test_open_sizes_symmetric_straddle() {
        let mut ledger = PositionLedger::new();
        let r = row("2024-03-01", dec!(100), dec!(5), dec!(5), dec!(100), 14);

        let qty = ledger.open(&r, dec!(100000)).unwrap();

        assert_eq!(qty, dec!(10000));
        let pos = ledger.position().unwrap();
        assert_eq!(pos.call_qty, dec!(10000));
        assert_eq!(pos.put_qty, dec!(10000));
        assert_eq!(pos.perp_qty, Decimal::ZERO);
        assert_eq!(pos.call_strike, dec!(100));
        assert_eq!(pos.put_strike, dec!(100));
        assert_eq!(pos.last_hedge_day, None);
    }

    #[test]
    fn test_open_cost_basis_equals_cash_deployed() {
        let mut ledger = PositionLedger::new();
        let r = row("2024-03-01", dec!(100), dec!(7), dec!(3), dec!(100), 14);

        ledger.open(&r, dec!(50000)).unwrap();

        let pos = ledger.position().unwrap();
        assert_eq!(pos.cost_basis(), dec!(50000));
        assert_eq!(pos.call_cost, dec!(35000));
        assert_eq!(pos.put_cost, dec!(15000));
    }

    #[test]
    fn test_open_rejected_while_position_active() {
        let mut ledger = PositionLedger::new();
        let r = row("2024-03-01", dec!(100), dec!(5), dec!(5), dec!(100), 14);
        ledger.open(&r, dec!(1000)).unwrap();

        let err = ledger.open(&r, dec!(1000)).unwrap_err();
        assert!(matches!(err, EngineError::PositionAlreadyOpen(_)));
        // First position untouched.
        assert_eq!(ledger.position().unwrap().call_qty, dec!(100));
    }

    #[test]
    fn test_open_rejected_without_cash_or_premium() {
        let mut ledger = PositionLedger::new();
        let r = row("2024-03-01", dec!(100), dec!(5), dec!(5), dec!(100), 14);
        assert!(matches!(
            ledger.open(&r, Decimal::ZERO).unwrap_err(),
            EngineError::OpenFailed(_)
        ));

        let free = row("2024-03-01", dec!(100), dec!(0), dec!(0), dec!(100), 14);
        assert!(matches!(
            ledger.open(&free, dec!(1000)).unwrap_err(),
            EngineError::OpenFailed(_)
        ));
        assert!(!ledger.is_open());
    }

    #[test]
    fn test_close_at_unchanged_prices_realizes_zero() {
        let mut ledger = PositionLedger::new();
        let r = row("2024-03-01", dec!(100), dec!(5), dec!(5), dec!(100), 14);
        ledger.open(&r, dec!(100000)).unwrap();

        let outcome = ledger.close(&r).unwrap();

        assert_eq!(outcome.realized, Decimal::ZERO);
        assert_eq!(outcome.proceeds, dec!(100000));
        assert!(!ledger.is_open());
    }

    #[test]
    fn test_close_values_perp_leg_on_absolute_quantity() {
        let mut ledger = PositionLedger::new();
        let r = row("2024-03-01", dec!(100), dec!(5), dec!(5), dec!(100), 14);
        ledger.open(&r, dec!(10000)).unwrap();

        // Short 2 perp at 100: cost accrues as an absolute outlay.
        {
            let pos = ledger.position_mut().unwrap();
            pos.perp_qty = dec!(-2);
            pos.perp_cost = dec!(200);
        }

        let outcome = ledger.close(&r).unwrap();
        // 1000 * 5 + 1000 * 5 + |−2| * 100 = 10200 against a 10200 basis.
        assert_eq!(outcome.proceeds, dec!(10200));
        assert_eq!(outcome.realized, Decimal::ZERO);
    }

    #[test]
    fn test_close_without_position_is_precondition_error() {
        let mut ledger = PositionLedger::new();
        let r = row("2024-03-01", dec!(100), dec!(5), dec!(5), dec!(100), 14);
        assert_eq!(
            ledger.close(&r).unwrap_err(),
            EngineError::NoOpenPosition("close")
        );
    }
}
