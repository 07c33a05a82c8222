//! Minimal CSV historic feed adapter (spec §6, Design Note §9 "reflection-driven column
//! detection... replace with an explicit pattern parser plus a declarative column-mapping enum").
//!
//! One file per asset. Columns are identified either by auto-detecting a header row
//! (`TIME|DATE, OPEN, HIGH, LOW, CLOSE, (ADJ_CLOSE|ADJ CLOSE), VOLUME`) or by an explicit pattern
//! string using the characters `T O H L C A V ? X _` (time, open, high, low, close, adjusted
//! close, volume, auto-detect, exclude, filler). Parsed rows are pushed into a
//! [`HistoricPriceStore`], which then serves as the [`crate::data::feed::Feed`] implementation.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::data::error::DataError;
use crate::data::store::HistoricPriceStore;
use crate::event::{PriceBarData, PriceItem};
use crate::model::asset::{Asset, AssetType};
use crate::model::currency::Currency;

/// The role a single CSV column plays, per spec §6's `T O H L C A V ? X _` pattern characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Time,
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
    /// `?`: auto-detect this column from its header text.
    Auto,
    /// `X` or `_`: not a price column, skip it.
    Skip,
}

impl ColumnRole {
    fn from_pattern_char(c: char) -> Result<Self, DataError> {
        match c {
            'T' => Ok(ColumnRole::Time),
            'O' => Ok(ColumnRole::Open),
            'H' => Ok(ColumnRole::High),
            'L' => Ok(ColumnRole::Low),
            'C' => Ok(ColumnRole::Close),
            'A' => Ok(ColumnRole::AdjClose),
            'V' => Ok(ColumnRole::Volume),
            '?' => Ok(ColumnRole::Auto),
            'X' | '_' => Ok(ColumnRole::Skip),
            other => Err(DataError::InvalidColumnPattern(other.to_string())),
        }
    }

    /// Matches a header cell against the known column synonyms (spec §6). Falls back to `Skip`
    /// for unrecognised headers rather than erroring, since CSV exports routinely carry extra
    /// columns (OpenInt, Dividends, Splits, ...).
    fn from_header(header: &str) -> ColumnRole {
        match header.trim().to_ascii_uppercase().as_str() {
            "TIME" | "DATE" => ColumnRole::Time,
            "OPEN" => ColumnRole::Open,
            "HIGH" => ColumnRole::High,
            "LOW" => ColumnRole::Low,
            "CLOSE" => ColumnRole::Close,
            "ADJ_CLOSE" | "ADJ CLOSE" | "ADJCLOSE" => ColumnRole::AdjClose,
            "VOLUME" => ColumnRole::Volume,
            _ => ColumnRole::Skip,
        }
    }
}

/// Parses an explicit column pattern string (one char per CSV column) into column roles.
pub fn parse_column_pattern(pattern: &str) -> Result<Vec<ColumnRole>, DataError> {
    pattern.chars().map(ColumnRole::from_pattern_char).collect()
}

/// Resolves a header row into column roles, applying auto-detection to any column whose
/// `explicit` role is `None` or `Auto`.
fn resolve_header(header: &csv::StringRecord, explicit: Option<&[ColumnRole]>) -> Vec<ColumnRole> {
    header
        .iter()
        .enumerate()
        .map(|(i, cell)| match explicit.and_then(|roles| roles.get(i)) {
            Some(ColumnRole::Auto) | None => ColumnRole::from_header(cell),
            Some(&role) => role,
        })
        .collect()
}

/// `config.properties`-style settings recognised by the CSV adapter (spec §6).
#[derive(Debug, Clone)]
pub struct CsvConfig {
    pub file_extension: String,
    /// Explicit column pattern (`file.pattern`); `None` falls back to header auto-detection.
    pub file_pattern: Option<String>,
    /// Rows to skip before the header/data begins (`file.skip`).
    pub file_skip: usize,
    pub asset_type: AssetType,
    pub asset_exchange: String,
    pub asset_currency: Currency,
    /// Use the adjusted-close column as `close` when present (`price.adjust`).
    pub price_adjust: bool,
    /// Reject the whole file if a relative price jump exceeds `price_threshold` (`price.validate`).
    pub price_validate: bool,
    pub price_threshold: f64,
    /// Resolves Open Question (a): a zero `OPEN` is dropped rather than kept as `NaN`, matching
    /// the source's `skipZeroPrice` default; configurable per spec §9.
    pub skip_zero_open: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            file_extension: "csv".to_string(),
            file_pattern: None,
            file_skip: 0,
            asset_type: AssetType::Stock,
            asset_exchange: "SMART".to_string(),
            asset_currency: Currency::usd(),
            price_adjust: false,
            price_validate: false,
            price_threshold: 0.5,
            skip_zero_open: true,
        }
    }
}

/// Parses one timestamp cell against the formats named in spec §6, in the stated order:
/// `yyyyMMdd`, `yyyy-MM-dd`, ISO instant, `yyyy-MM-dd HH:mm:ss`, epoch-millis (13 digits).
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DataError> {
    let raw = raw.trim();

    if raw.len() == 13 && raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(millis) = raw.parse::<i64>() {
            if let Some(dt) = Utc.timestamp_millis_opt(millis).single() {
                return Ok(dt);
            }
        }
    }
    if let Ok(fixed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(fixed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y%m%d") {
        return Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
    }

    Err(DataError::UnknownTimeFormat(raw.to_string()))
}

#[derive(Debug, Default)]
struct Row {
    time: Option<DateTime<Utc>>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    adj_close: Option<f64>,
    volume: Option<f64>,
}

fn parse_row(record: &csv::StringRecord, roles: &[ColumnRole]) -> Result<Row, DataError> {
    let mut row = Row::default();
    for (cell, role) in record.iter().zip(roles) {
        match role {
            ColumnRole::Time => row.time = Some(parse_timestamp(cell)?),
            ColumnRole::Open => row.open = cell.trim().parse().ok(),
            ColumnRole::High => row.high = cell.trim().parse().ok(),
            ColumnRole::Low => row.low = cell.trim().parse().ok(),
            ColumnRole::Close => row.close = cell.trim().parse().ok(),
            ColumnRole::AdjClose => row.adj_close = cell.trim().parse().ok(),
            ColumnRole::Volume => row.volume = cell.trim().parse().ok(),
            ColumnRole::Auto | ColumnRole::Skip => {}
        }
    }
    Ok(row)
}

/// Reads one CSV file for `symbol` into a [`HistoricPriceStore`]. Unparseable rows are logged and
/// skipped (spec §7 "Feed" errors); a relative price jump beyond `config.price_threshold` (when
/// `price_validate` is set) rejects the whole file.
pub fn read_csv_file(path: &Path, symbol: &str, config: &CsvConfig) -> Result<HistoricPriceStore, DataError> {
    let explicit = config
        .file_pattern
        .as_deref()
        .map(parse_column_pattern)
        .transpose()?;

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    for _ in 0..config.file_skip {
        let mut discard = csv::StringRecord::new();
        reader.read_record(&mut discard)?;
    }

    let roles = resolve_header(reader.headers()?, explicit.as_deref());
    let asset = Asset::new(symbol, config.asset_type, config.asset_currency.clone(), config.asset_exchange.clone());

    let mut store = HistoricPriceStore::new();
    let mut prev_close: Option<f64> = None;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unparseable CSV row");
                continue;
            }
        };

        let row = match parse_row(&record, &roles) {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unparseable CSV row");
                continue;
            }
        };

        let Some(time) = row.time else {
            tracing::warn!("skipping CSV row with no parseable timestamp");
            continue;
        };

        let open = row.open.unwrap_or(f64::NAN);
        if config.skip_zero_open && open == 0.0 {
            continue;
        }

        let close = if config.price_adjust {
            row.adj_close.or(row.close)
        } else {
            row.close
        }
        .unwrap_or(f64::NAN);

        if config.price_validate {
            if let Some(prev) = prev_close {
                if prev != 0.0 && ((close - prev) / prev).abs() > config.price_threshold {
                    return Err(DataError::PriceJumpExceeded {
                        asset: symbol.to_string(),
                        threshold: config.price_threshold,
                    });
                }
            }
            prev_close = Some(close);
        }

        let bar = PriceBarData {
            open,
            high: row.high.unwrap_or(close),
            low: row.low.unwrap_or(close),
            close,
            volume: row.volume.unwrap_or(f64::NAN),
            span: chrono::Duration::zero(),
        };
        store.add(time, PriceItem::PriceBar { asset: asset.clone(), bar });
    }

    Ok(store)
}
