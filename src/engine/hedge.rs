//! Threshold-driven delta hedging against the perpetual-futures leg.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::debug;

use crate::data::MarketRow;
use crate::engine::delta::{self, OptionType};
use crate::engine::error::EngineError;
use crate::engine::ledger::Position;

/// Floor on annualized time-to-expiry. Keeps the delta finite on expiry day
/// while staying effectively zero.
const MIN_TIME_TO_EXPIRY_YEARS: Decimal = dec!(0.000001);

const DAYS_PER_YEAR: Decimal = dec!(365);

/// The engine prices under a zero risk-free rate.
const RISK_FREE_RATE: Decimal = Decimal::ZERO;

/// Position-scaled exposure of each leg as of one market row.
///
/// `total` is the sum of the already-quantity-scaled per-leg deltas. A perp
/// has delta exactly 1 per unit, so its contribution is the signed quantity
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeltaExposure {
    pub call: Decimal,
    pub put: Decimal,
    pub perp: Decimal,
    pub total: Decimal,
}

/// Decides and executes perp hedge adjustments against an open position.
#[derive(Debug, Clone)]
pub struct HedgeController {
    /// Dead-band as a fraction of one leg's quantity; drift inside the band
    /// is noise and is not traded.
    band_fraction: Decimal,
    /// Minimum perp trade size. Smaller adjustments are dust and suppressed.
    min_lot: Decimal,
}

impl Default for HedgeController {
    fn default() -> Self {
        Self {
            band_fraction: dec!(0.1),
            min_lot: dec!(0.001),
        }
    }
}

impl HedgeController {
    /// Compute per-leg exposure without touching the position.
    pub fn exposure(
        &self,
        position: &Position,
        row: &MarketRow,
    ) -> Result<DeltaExposure, EngineError> {
        let t = time_to_expiry_years(row.days_to_expiry);

        let call = delta::delta(
            row.spot_price,
            position.call_strike,
            t,
            RISK_FREE_RATE,
            row.call_iv,
            OptionType::Call,
        )
        .map_err(|e| EngineError::HedgeFailed(e.to_string()))?
            * position.call_qty;

        let put = delta::delta(
            row.spot_price,
            position.put_strike,
            t,
            RISK_FREE_RATE,
            row.put_iv,
            OptionType::Put,
        )
        .map_err(|e| EngineError::HedgeFailed(e.to_string()))?
            * position.put_qty;

        let perp = position.perp_qty;

        Ok(DeltaExposure {
            call,
            put,
            perp,
            total: call + put + perp,
        })
    }

    /// Rebalance the perp hedge if aggregate exposure has drifted outside the
    /// dead band.
    ///
    /// A triggered hedge neutralizes the whole exposure in one step. Returns
    /// the exposure as computed before any adjustment, for reporting.
    pub fn rebalance(
        &self,
        position: &mut Position,
        row: &MarketRow,
        today: NaiveDate,
    ) -> Result<DeltaExposure, EngineError> {
        let exposure = self.exposure(position, row)?;

        let band = (self.band_fraction * position.put_qty)
            .max(self.band_fraction * position.call_qty);
        if exposure.total.abs() <= band {
            debug!(
                date = %row.date,
                total_delta = %exposure.total,
                %band,
                "delta inside dead band, no hedge"
            );
            return Ok(exposure);
        }

        let adjustment = -exposure.total;
        if adjustment.abs() < self.min_lot {
            debug!(date = %row.date, %adjustment, "hedge below minimum lot, suppressed");
            return Ok(exposure);
        }

        position.perp_qty += adjustment;
        position.perp_cost += adjustment.abs() * row.perp_price;
        position.last_hedge_day = Some(today);

        debug!(
            date = %row.date,
            %adjustment,
            perp_qty = %position.perp_qty,
            perp_price = %row.perp_price,
            "rebalanced perp hedge"
        );

        Ok(exposure)
    }
}

/// Annualized time to expiry with the near-expiry floor applied.
fn time_to_expiry_years(days_to_expiry: i64) -> Decimal {
    (Decimal::from(days_to_expiry) / DAYS_PER_YEAR).max(MIN_TIME_TO_EXPIRY_YEARS)
}
