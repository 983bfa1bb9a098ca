//! Day-by-day simulation of the gamma-scalping strategy.
//!
//! The driving loop owns policy, the engine owns state: open on the first
//! row, attempt a hedge whenever the configured number of days has elapsed,
//! snapshot every day a position is open, and close at expiry or when the
//! data runs out.

mod metrics;

pub use metrics::SimulationMetrics;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::data::MarketRow;
use crate::engine::GammaScalpingEngine;

/// Complete result of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub snapshots: Vec<crate::engine::PortfolioSnapshot>,
    pub realized_pnl: Decimal,
    pub final_cash: Decimal,
    pub metrics: SimulationMetrics,
}

impl SimulationResult {
    /// Export the daily snapshots to CSV.
    pub fn snapshots_to_csv(&self, path: &str) -> Result<()> {
        use std::io::Write;
        let mut file = std::fs::File::create(path)?;
        writeln!(
            file,
            "date,spot,expiry,days_to_expiry,call_delta,put_delta,perp_delta,total_delta,cost,value,unrealized_pnl,realized_pnl,total_asset,return"
        )?;

        for snap in &self.snapshots {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                snap.date,
                snap.spot,
                snap.expiry,
                snap.days_to_expiry,
                snap.call_delta,
                snap.put_delta,
                snap.perp_delta,
                snap.total_delta,
                snap.cost,
                snap.value,
                snap.unrealized_pnl,
                snap.realized_pnl,
                snap.total_asset,
                snap.return_on_capital,
            )?;
        }

        Ok(())
    }

    /// Export the full result as pretty-printed JSON.
    pub fn to_json_file(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        format!(
            "{}\n\nRealized PnL: ${:.2}\nFinal Cash:   ${:.2}",
            self.metrics.summary(),
            self.realized_pnl,
            self.final_cash,
        )
    }
}

/// One gamma-scalping simulation over an ordered row series.
pub struct Simulation {
    engine: GammaScalpingEngine,
    rows: Vec<MarketRow>,
}

impl Simulation {
    /// Build a simulation from validated config and engine-facing rows.
    pub fn new(rows: Vec<MarketRow>, config: &SimulationConfig) -> Result<Self> {
        let engine = GammaScalpingEngine::new(config.initial_capital, config.hedge_freq_days)?;
        Ok(Self { engine, rows })
    }

    /// Run the simulation to completion.
    pub fn run(mut self) -> Result<SimulationResult> {
        if self.rows.is_empty() {
            anyhow::bail!("No market rows to simulate");
        }

        info!(
            start = %self.rows[0].date,
            end = %self.rows[self.rows.len() - 1].date,
            rows = self.rows.len(),
            capital = %self.engine.initial_capital(),
            "starting simulation"
        );

        let hedge_freq = i64::from(self.engine.hedge_freq_days());
        let mut snapshots = Vec::with_capacity(self.rows.len());
        let mut hedge_trades: u64 = 0;
        let mut last_hedge_attempt: Option<NaiveDate> = None;

        let rows = std::mem::take(&mut self.rows);
        for (i, row) in rows.iter().enumerate() {
            // 1. Open on the first row.
            if i == 0 {
                self.engine.open(row)?;
            }

            // 2. Hedge when due; otherwise just value the book.
            let due = match last_hedge_attempt {
                None => true,
                Some(day) => (row.date - day).num_days() >= hedge_freq,
            };
            let exposure = if due {
                let perp_before = self
                    .engine
                    .position()
                    .map(|p| p.perp_qty)
                    .unwrap_or_default();
                let exposure = self.engine.hedge(row, row.date)?;
                last_hedge_attempt = Some(row.date);

                let perp_after = self
                    .engine
                    .position()
                    .map(|p| p.perp_qty)
                    .unwrap_or_default();
                if perp_after != perp_before {
                    hedge_trades += 1;
                }
                exposure
            } else {
                self.engine.exposure(row)?
            };

            // 3. Record the day's snapshot.
            let snapshot = self.engine.snapshot(row, &exposure)?;
            debug!(
                date = %snapshot.date,
                total_delta = %snapshot.total_delta,
                total_asset = %snapshot.total_asset,
                "simulated day"
            );
            snapshots.push(snapshot);

            // 4. Close at expiry, or on the final row if the data ends early.
            if row.days_to_expiry == 0 || i + 1 == rows.len() {
                self.engine.close(row)?;
                break;
            }
        }

        let metrics = SimulationMetrics::calculate(
            &snapshots,
            self.engine.initial_capital(),
            self.engine.cash(),
            hedge_trades,
            rows.len(),
        );

        info!(final_cash = %self.engine.cash(), "simulation complete");

        Ok(SimulationResult {
            snapshots,
            realized_pnl: self.engine.realized_pnl(),
            final_cash: self.engine.cash(),
            metrics,
        })
    }
}
