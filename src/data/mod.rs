//! Historical market data loading.
//!
//! Parses the daily option/perp price table from CSV, sorts it by date, and
//! stamps each row with an expiry date and remaining days. The engine only
//! ever sees fully-typed [`MarketRow`] values, so shape validation happens
//! here exactly once.

pub mod calendar;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One trading day's quotes as parsed from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub date: NaiveDate,
    pub spot_price: Decimal,
    pub call_price: Decimal,
    pub put_price: Decimal,
    pub call_iv: Decimal,
    pub put_iv: Decimal,
    pub perp_price: Decimal,
}

impl QuoteRow {
    fn parse(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 7 {
            anyhow::bail!(
                "Expected 7 columns (Date,SpotPrice,CallPrice,PutPrice,CallIV,PutIV,PerpPrice), got {}",
                parts.len()
            );
        }

        let row = Self {
            date: parts[0]
                .trim()
                .parse()
                .with_context(|| format!("Invalid Date: {}", parts[0]))?,
            spot_price: parts[1]
                .trim()
                .parse()
                .with_context(|| format!("Invalid SpotPrice: {}", parts[1]))?,
            call_price: parts[2]
                .trim()
                .parse()
                .with_context(|| format!("Invalid CallPrice: {}", parts[2]))?,
            put_price: parts[3]
                .trim()
                .parse()
                .with_context(|| format!("Invalid PutPrice: {}", parts[3]))?,
            call_iv: parts[4]
                .trim()
                .parse()
                .with_context(|| format!("Invalid CallIV: {}", parts[4]))?,
            put_iv: parts[5]
                .trim()
                .parse()
                .with_context(|| format!("Invalid PutIV: {}", parts[5]))?,
            perp_price: parts[6]
                .trim()
                .parse()
                .with_context(|| format!("Invalid PerpPrice: {}", parts[6]))?,
        };

        for (name, value) in [
            ("SpotPrice", row.spot_price),
            ("CallPrice", row.call_price),
            ("PutPrice", row.put_price),
            ("CallIV", row.call_iv),
            ("PutIV", row.put_iv),
            ("PerpPrice", row.perp_price),
        ] {
            if value < Decimal::ZERO {
                anyhow::bail!("{name} must be non-negative, got {value}");
            }
        }

        Ok(row)
    }
}

/// A quote row stamped with its contract expiry, as consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRow {
    pub date: NaiveDate,
    pub spot_price: Decimal,
    pub call_price: Decimal,
    pub put_price: Decimal,
    pub call_iv: Decimal,
    pub put_iv: Decimal,
    pub perp_price: Decimal,
    pub expiry: NaiveDate,
    /// Whole days until expiry, clamped at zero for rows past it.
    pub days_to_expiry: i64,
}

/// CSV data loader for the daily price table.
///
/// Expected CSV format:
/// ```csv
/// Date,SpotPrice,CallPrice,PutPrice,CallIV,PutIV,PerpPrice
/// 2024-03-01,62000,2100.5,1980.25,0.52,0.55,62010.0
/// ```
#[derive(Debug, Clone)]
pub struct CsvDataLoader {
    /// Parsed quotes, sorted by date.
    quotes: Vec<QuoteRow>,
}

impl CsvDataLoader {
    /// Load data from a CSV file.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

        let loader = Self::from_csv_content(&content)?;
        info!(
            rows = loader.len(),
            path = %path.display(),
            "loaded market data"
        );
        Ok(loader)
    }

    /// Load data from CSV content string. Input row order is not trusted;
    /// quotes are sorted by date before use.
    pub fn from_csv_content(content: &str) -> Result<Self> {
        let mut quotes: Vec<QuoteRow> = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            // Skip header
            if line_num == 0 && line.starts_with("Date") {
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            let row = QuoteRow::parse(line)
                .with_context(|| format!("Failed to parse line {}: {}", line_num + 1, line))?;
            quotes.push(row);
        }

        if quotes.is_empty() {
            anyhow::bail!("CSV file contains no data rows");
        }

        quotes.sort_by_key(|q| q.date);

        Ok(Self { quotes })
    }

    /// Build a loader from already-parsed quotes.
    pub fn from_quotes(mut quotes: Vec<QuoteRow>) -> Self {
        quotes.sort_by_key(|q| q.date);
        Self { quotes }
    }

    /// Get total number of quote rows.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Check if the loader has no data.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// First and last trading day in the data.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.quotes.first(), self.quotes.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }

    /// Look up a single day's quotes.
    pub fn quote_on(&self, date: NaiveDate) -> Option<&QuoteRow> {
        self.quotes.iter().find(|q| q.date == date)
    }

    /// Stamp every quote with `expiry` and the remaining whole days,
    /// producing the engine-facing row series in ascending date order.
    pub fn with_expiry(&self, expiry: NaiveDate) -> Vec<MarketRow> {
        self.quotes
            .iter()
            .map(|q| MarketRow {
                date: q.date,
                spot_price: q.spot_price,
                call_price: q.call_price,
                put_price: q.put_price,
                call_iv: q.call_iv,
                put_iv: q.put_iv,
                perp_price: q.perp_price,
                expiry,
                days_to_expiry: (expiry - q.date).num_days().max(0),
            })
            .collect()
    }
}

#[cfg(test)]
pub mod test_support {
    use super::MarketRow;
    use chrono::{Duration, NaiveDate};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Market row with both IVs at 0.5 and expiry `days` ahead of `date`.
    pub fn row(
        date: &str,
        spot: Decimal,
        call: Decimal,
        put: Decimal,
        perp: Decimal,
        days: i64,
    ) -> MarketRow {
        let date: NaiveDate = date.parse().unwrap();
        MarketRow {
            date,
            spot_price: spot,
            call_price: call,
            put_price: put,
            call_iv: dec!(0.5),
            put_iv: dec!(0.5),
            perp_price: perp,
            expiry: date + Duration::days(days),
            days_to_expiry: days,
        }
    }
}
