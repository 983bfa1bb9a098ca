//! Mark-to-market accounting for an open position.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::data::MarketRow;
use crate::engine::hedge::DeltaExposure;
use crate::engine::ledger::Position;

/// One day's portfolio report while a position is open.
///
/// Realized profit from earlier closes is already folded into `cash` by the
/// engine, so `total_asset = cash + value`; `realized_pnl` rides along for
/// reporting and is never added in a second time. Return is measured against
/// the engine's initial capital.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    pub spot: Decimal,
    pub expiry: NaiveDate,
    pub days_to_expiry: i64,
    pub call_delta: Decimal,
    pub put_delta: Decimal,
    pub perp_delta: Decimal,
    pub total_delta: Decimal,
    pub cost: Decimal,
    pub value: Decimal,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub total_asset: Decimal,
    pub return_on_capital: Decimal,
}

impl PortfolioSnapshot {
    /// Value the open position against `row`. Pure: reads state, mutates
    /// nothing.
    pub(crate) fn compute(
        row: &MarketRow,
        position: &Position,
        exposure: &DeltaExposure,
        cash: Decimal,
        realized_pnl: Decimal,
        initial_capital: Decimal,
    ) -> Self {
        let value = position.market_value(row);
        let cost = position.cost_basis();
        let total_asset = cash + value;

        Self {
            date: row.date,
            spot: row.spot_price,
            expiry: position.expiry,
            days_to_expiry: row.days_to_expiry,
            call_delta: exposure.call,
            put_delta: exposure.put,
            perp_delta: exposure.perp,
            total_delta: exposure.total,
            cost,
            value,
            unrealized_pnl: value - cost,
            realized_pnl,
            total_asset,
            return_on_capital: total_asset / initial_capital - Decimal::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::row;
    use crate::engine::ledger::PositionLedger;
    use rust_decimal_macros::dec;

    fn flat_exposure() -> DeltaExposure {
        DeltaExposure {
            call: dec!(5000),
            put: dec!(-4500),
            perp: Decimal::ZERO,
            total: dec!(500),
        }
    }

    #[test]
    fn test_snapshot_values_freshly_opened_position_at_cost() {
        let mut ledger = PositionLedger::new();
        let r = row("2024-03-01", dec!(100), dec!(5), dec!(5), dec!(100), 14);
        ledger.open(&r, dec!(100000)).unwrap();

        let snap = PortfolioSnapshot::compute(
            &r,
            ledger.position().unwrap(),
            &flat_exposure(),
            Decimal::ZERO,
            Decimal::ZERO,
            dec!(100000),
        );

        assert_eq!(snap.cost, dec!(100000));
        assert_eq!(snap.value, dec!(100000));
        assert_eq!(snap.unrealized_pnl, Decimal::ZERO);
        assert_eq!(snap.total_asset, dec!(100000));
        assert_eq!(snap.return_on_capital, Decimal::ZERO);
        assert_eq!(snap.total_delta, dec!(500));
    }

    #[test]
    fn test_snapshot_tracks_price_appreciation() {
        let mut ledger = PositionLedger::new();
        let open_row = row("2024-03-01", dec!(100), dec!(5), dec!(5), dec!(100), 14);
        ledger.open(&open_row, dec!(100000)).unwrap();

        // Both legs up 10%: 10000 * 5.5 * 2 = 110000.
        let later = row("2024-03-04", dec!(108), dec!(5.5), dec!(5.5), dec!(108), 11);
        let snap = PortfolioSnapshot::compute(
            &later,
            ledger.position().unwrap(),
            &flat_exposure(),
            Decimal::ZERO,
            Decimal::ZERO,
            dec!(100000),
        );

        assert_eq!(snap.value, dec!(110000));
        assert_eq!(snap.unrealized_pnl, dec!(10000));
        assert_eq!(snap.return_on_capital, dec!(0.1));
    }

    #[test]
    fn test_snapshot_is_bit_identical_and_read_only() {
        let mut ledger = PositionLedger::new();
        let r = row("2024-03-01", dec!(100), dec!(5), dec!(5), dec!(100), 14);
        ledger.open(&r, dec!(100000)).unwrap();
        let before = ledger.position().unwrap().clone();

        let exposure = flat_exposure();
        let first = PortfolioSnapshot::compute(
            &r,
            ledger.position().unwrap(),
            &exposure,
            dec!(250),
            dec!(42),
            dec!(100000),
        );
        let second = PortfolioSnapshot::compute(
            &r,
            ledger.position().unwrap(),
            &exposure,
            dec!(250),
            dec!(42),
            dec!(100000),
        );

        assert_eq!(first, second);
        assert_eq!(ledger.position().unwrap(), &before);
    }

    #[test]
    fn test_realized_pnl_is_reported_but_not_double_counted() {
        let mut ledger = PositionLedger::new();
        let r = row("2024-03-01", dec!(100), dec!(5), dec!(5), dec!(100), 14);
        ledger.open(&r, dec!(80000)).unwrap();

        // 20000 of cash includes 5000 realized from an earlier position.
        let snap = PortfolioSnapshot::compute(
            &r,
            ledger.position().unwrap(),
            &flat_exposure(),
            dec!(20000),
            dec!(5000),
            dec!(100000),
        );

        assert_eq!(snap.realized_pnl, dec!(5000));
        assert_eq!(snap.total_asset, dec!(100000));
    }
}
