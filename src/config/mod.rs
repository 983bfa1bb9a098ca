//! Configuration management for the gamma scalper.
//!
//! Loads settings from environment variables and config files.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Starting capital for the run
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,

    /// Days between hedge attempts in the driving loop
    #[serde(default = "default_hedge_freq_days")]
    pub hedge_freq_days: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            hedge_freq_days: default_hedge_freq_days(),
        }
    }
}

fn default_initial_capital() -> Decimal {
    Decimal::new(100_000, 0)
}

fn default_hedge_freq_days() -> u32 {
    2
}

impl SimulationConfig {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("SCALPER"))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine would refuse at construction time.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capital <= Decimal::ZERO {
            anyhow::bail!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            );
        }
        if self.hedge_freq_days == 0 {
            anyhow::bail!("hedge_freq_days must be at least 1");
        }
        Ok(())
    }
}
