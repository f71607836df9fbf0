//! Historical price loading from CSV and JSON files

use crate::error::{BacktestError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use crossover_core::PricePoint;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Supported price file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFileFormat {
    Csv,
    Json,
}

impl PriceFileFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(BacktestError::ParseError(format!(
                "Unsupported price file extension: {}",
                path.display()
            ))),
        }
    }
}

/// CSV row; close is read from its text form so no float parsing is involved
#[derive(Debug, Deserialize)]
struct CsvPriceRow {
    #[serde(alias = "Date", alias = "timestamp")]
    date: String,
    #[serde(
        alias = "Close",
        alias = "close_price",
        alias = "price",
        alias = "predicted_price",
        with = "rust_decimal::serde::str"
    )]
    close: Decimal,
}

/// JSON record; close may be a string or a number
#[derive(Debug, Deserialize)]
struct JsonPriceRecord {
    date: String,
    #[serde(alias = "close_price", alias = "price", alias = "predicted_price")]
    close: Decimal,
}

/// Loads daily closing prices and hands them to the engine in date order
pub struct DataLoader;

impl DataLoader {
    /// Load prices from a `.csv` or `.json` file
    pub fn load_prices(path: impl AsRef<Path>) -> Result<Vec<PricePoint>> {
        let path = path.as_ref();
        let prices = match PriceFileFormat::from_path(path)? {
            PriceFileFormat::Csv => Self::prices_from_csv(std::fs::File::open(path)?)?,
            PriceFileFormat::Json => Self::prices_from_json(&std::fs::read_to_string(path)?)?,
        };

        if let Some((start, end)) = Self::data_range(&prices) {
            info!(
                path = %path.display(),
                count = prices.len(),
                start = %start,
                end = %end,
                "Loaded price history"
            );
        } else {
            info!(path = %path.display(), "Price file contains no rows");
        }

        Ok(prices)
    }

    /// Parse CSV with a header row containing `date` and `close` columns.
    /// Other columns (open, high, low, volume, ...) are ignored.
    pub fn prices_from_csv<R: Read>(reader: R) -> Result<Vec<PricePoint>> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut prices = Vec::new();
        for row in csv_reader.deserialize::<CsvPriceRow>() {
            let row = row?;
            prices.push(PricePoint::new(parse_date(&row.date)?, row.close));
        }

        Self::normalize(prices)
    }

    /// Parse a JSON array of `{ "date": ..., "close": ... }` records
    pub fn prices_from_json(json: &str) -> Result<Vec<PricePoint>> {
        let records: Vec<JsonPriceRecord> =
            serde_json::from_str(json).map_err(|e| BacktestError::ParseError(e.to_string()))?;
        let prices = records
            .into_iter()
            .map(|r| Ok(PricePoint::new(parse_date(&r.date)?, r.close)))
            .collect::<Result<Vec<_>>>()?;

        Self::normalize(prices)
    }

    /// Sort ascending by date, reject duplicate dates and non-positive closes
    pub fn normalize(mut prices: Vec<PricePoint>) -> Result<Vec<PricePoint>> {
        prices.sort_by(|a, b| a.date.cmp(&b.date));

        for pair in prices.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(BacktestError::DuplicateDate(pair[1].date));
            }
        }

        if let Some(bad) = prices.iter().find(|p| p.close <= Decimal::ZERO) {
            return Err(BacktestError::InvalidPrice {
                date: bad.date,
                close: bad.close,
            });
        }

        Ok(prices)
    }

    /// First and last date of an ordered series
    pub fn data_range(prices: &[PricePoint]) -> Option<(NaiveDate, NaiveDate)> {
        match (prices.first(), prices.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}

/// Accepts `YYYY-MM-DD` or a `YYYY-MM-DD HH:MM:SS` timestamp
fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
        })
        .map_err(|e| BacktestError::ParseError(format!("Invalid date '{}': {}", value, e)))
}
