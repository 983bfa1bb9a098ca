//! Performance metrics for a simulation run.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::engine::PortfolioSnapshot;

/// Run-level performance summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationMetrics {
    /// Total absolute return (final - initial)
    pub total_return: Decimal,
    /// Total return as percentage of initial capital
    pub total_return_pct: Decimal,
    /// Maximum peak-to-trough drawdown of total asset value (fraction)
    pub max_drawdown: Decimal,
    /// Number of executed perp hedge adjustments
    pub hedge_trades: u64,
    /// Trading days in the simulated window
    pub days_simulated: usize,
    /// Days a position was open (snapshots recorded)
    pub days_in_position: usize,
}

impl SimulationMetrics {
    /// Calculate metrics from the snapshot series and final balances.
    pub fn calculate(
        snapshots: &[PortfolioSnapshot],
        initial_capital: Decimal,
        final_asset: Decimal,
        hedge_trades: u64,
        days_simulated: usize,
    ) -> Self {
        let total_return = final_asset - initial_capital;
        let total_return_pct = if initial_capital > Decimal::ZERO {
            total_return / initial_capital * dec!(100)
        } else {
            Decimal::ZERO
        };

        Self {
            total_return,
            total_return_pct,
            max_drawdown: calculate_max_drawdown(snapshots),
            hedge_trades,
            days_simulated,
            days_in_position: snapshots.len(),
        }
    }

    /// Format metrics as a summary string.
    pub fn summary(&self) -> String {
        format!(
            r#"═══════════════════════════════════════════════
GAMMA SCALP RESULTS ({} days, {} in position)
═══════════════════════════════════════════════
RETURNS
  Total Return:      ${:.2} ({:.2}%)

RISK
  Max Drawdown:      {:.2}%

ACTIVITY
  Hedge Trades:      {}
═══════════════════════════════════════════════"#,
            self.days_simulated,
            self.days_in_position,
            self.total_return,
            self.total_return_pct,
            self.max_drawdown * dec!(100),
            self.hedge_trades,
        )
    }
}

/// Maximum drawdown over the snapshot total-asset series.
fn calculate_max_drawdown(snapshots: &[PortfolioSnapshot]) -> Decimal {
    let mut peak = Decimal::ZERO;
    let mut max_dd = Decimal::ZERO;

    for snap in snapshots {
        if snap.total_asset > peak {
            peak = snap.total_asset;
        }
        let dd = if peak > Decimal::ZERO {
            (peak - snap.total_asset) / peak
        } else {
            Decimal::ZERO
        };
        if dd > max_dd {
            max_dd = dd;
        }
    }

    max_dd
}
