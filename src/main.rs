//! Gamma Scalper - Main Entry Point
//!
//! Runs the straddle simulation against a historical CSV price table.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use gamma_scalper::config::SimulationConfig;
use gamma_scalper::data::{calendar, CsvDataLoader};
use gamma_scalper::sim::Simulation;
use rust_decimal::Decimal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Gamma Scalper CLI
#[derive(Parser)]
#[command(name = "gamma-scalper")]
#[command(version, about = "Gamma-scalping straddle simulation on historical data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gamma-scalping simulation on historical data
    Backtest {
        /// Path to CSV data file
        #[arg(short, long)]
        data: String,

        /// Contract expiry date (YYYY-MM-DD); derived from the data when omitted
        #[arg(short, long)]
        expiry: Option<NaiveDate>,

        /// Calendar rule used to derive the expiry from the final data month
        #[arg(long, value_enum, default_value = "third-friday")]
        expiry_rule: ExpiryRule,

        /// Initial capital, overriding the config file
        #[arg(short, long)]
        capital: Option<Decimal>,

        /// Days between hedge attempts, overriding the config file
        #[arg(long)]
        hedge_freq: Option<u32>,

        /// Directory for snapshots.csv and result.json
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show row count, date range, and candidate expiry dates for a data file
    Inspect {
        /// Path to CSV data file
        #[arg(short, long)]
        data: String,
    },
}

/// Monthly expiry conventions supported by the calendar.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExpiryRule {
    ThirdFriday,
    LastFriday,
}

impl ExpiryRule {
    fn resolve(self, year: i32, month: u32) -> Option<NaiveDate> {
        match self {
            ExpiryRule::ThirdFriday => calendar::third_friday(year, month),
            ExpiryRule::LastFriday => calendar::last_friday(year, month),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            data,
            expiry,
            expiry_rule,
            capital,
            hedge_freq,
            output,
        } => run_backtest(&data, expiry, expiry_rule, capital, hedge_freq, output),
        Commands::Inspect { data } => inspect_data(&data),
    }
}

fn run_backtest(
    data: &str,
    expiry: Option<NaiveDate>,
    expiry_rule: ExpiryRule,
    capital: Option<Decimal>,
    hedge_freq: Option<u32>,
    output: Option<String>,
) -> Result<()> {
    let mut config = SimulationConfig::load()?;
    if let Some(capital) = capital {
        config.initial_capital = capital;
    }
    if let Some(freq) = hedge_freq {
        config.hedge_freq_days = freq;
    }
    config.validate()?;

    let loader = CsvDataLoader::new(data)?;
    let (_, last_day) = loader
        .date_range()
        .context("data file has no usable rows")?;

    let expiry = match expiry {
        Some(date) => date,
        None => expiry_rule
            .resolve(last_day.year(), last_day.month())
            .context("could not derive an expiry date from the data")?,
    };
    if expiry < last_day {
        warn!(%expiry, %last_day, "expiry falls before the end of the data; later rows are ignored");
    }

    info!(%expiry, capital = %config.initial_capital, "configured run");

    let rows = loader.with_expiry(expiry);
    let result = Simulation::new(rows, &config)?.run()?;

    println!("{}", result.summary());

    if let Some(dir) = output {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {dir}"))?;
        let csv_path = format!("{dir}/snapshots.csv");
        let json_path = format!("{dir}/result.json");
        result.snapshots_to_csv(&csv_path)?;
        result.to_json_file(&json_path)?;
        info!(csv = %csv_path, json = %json_path, "wrote results");
    }

    Ok(())
}

fn inspect_data(data: &str) -> Result<()> {
    let loader = CsvDataLoader::new(data)?;
    let (first, last) = loader
        .date_range()
        .context("data file has no usable rows")?;

    println!("Rows:        {}", loader.len());
    println!("Date range:  {first} to {last}");

    let (year, month) = (last.year(), last.month());
    if let Some(third) = calendar::third_friday(year, month) {
        println!("Third Friday {year}-{month:02}: {third}");
    }
    if let Some(last_fri) = calendar::last_friday(year, month) {
        println!("Last Friday  {year}-{month:02}: {last_fri}");
    }

    Ok(())
}
