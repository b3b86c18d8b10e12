//! Loading of the historical price file that feeds [`ReturnStatistics`].
//!
//! The file is comma separated, newest date first, with the closing price in
//! the second column. Prices may be quoted and carry thousands separators.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::core::{ReturnStatistics, StatisticsError};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to open price file {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("failed to read price data: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Statistics(#[from] StatisticsError),
}

/// Reads prices and returns them oldest first. Rows without a positive numeric
/// price in the second column are skipped.
pub fn read_prices<R: Read>(reader: R) -> Result<Vec<f64>, HistoryError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut prices = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let line = idx + 2; // 1-indexed, skip header
        let record = record?;
        let field = record.get(1).and_then(|raw| std::str::from_utf8(raw).ok());
        match field.and_then(parse_price) {
            Some(price) => prices.push(price),
            None => debug!(line, "skipping row without a usable price"),
        }
    }

    prices.reverse();
    Ok(prices)
}

/// Reads the price file at `path` and derives daily return statistics.
pub fn load_statistics(path: impl AsRef<Path>) -> Result<ReturnStatistics, HistoryError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| HistoryError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let prices = read_prices(file)?;
    let stats = ReturnStatistics::from_prices(&prices)?;

    info!(
        days = prices.len(),
        mean_daily_return = stats.mean_daily_return,
        std_dev_daily_return = stats.std_dev_daily_return,
        annualized_return = stats.annualized_return(),
        annualized_volatility = stats.annualized_volatility(),
        "historical data loaded"
    );
    Ok(stats)
}

fn parse_price(field: &str) -> Option<f64> {
    let cleaned: String = field.chars().filter(|c| *c != ',' && *c != '"').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price > 0.0)
}
