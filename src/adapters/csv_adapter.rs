//! CSV file data adapter.
//!
//! One file per instrument, named `{code}_{exchange}.csv`, with a header row
//! and `date,open,high,low,close,volume` columns.

use crate::domain::error::TrendsignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str, exchange: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, exchange))
    }
}

fn data_error(reason: String) -> TrendsignalError {
    TrendsignalError::Data { reason }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'r str, TrendsignalError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| data_error(format!("missing {} column", name)))
}

fn parse_price(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<f64, TrendsignalError> {
    field(record, index, name)?
        .parse()
        .map_err(|e| data_error(format!("invalid {} value: {}", name, e)))
}

fn parse_record(record: &csv::StringRecord) -> Result<OhlcvBar, TrendsignalError> {
    let date = NaiveDate::parse_from_str(field(record, 0, "date")?, "%Y-%m-%d")
        .map_err(|e| data_error(format!("invalid date format: {}", e)))?;
    let volume: i64 = field(record, 5, "volume")?
        .parse()
        .map_err(|e| data_error(format!("invalid volume value: {}", e)))?;

    Ok(OhlcvBar {
        date,
        open: parse_price(record, 1, "open")?,
        high: parse_price(record, 2, "high")?,
        low: parse_price(record, 3, "low")?,
        close: parse_price(record, 4, "close")?,
        volume,
    })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TrendsignalError> {
        let path = self.csv_path(code, exchange);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;
            let bar = parse_record(&record)?;
            if bar.date >= start_date && bar.date <= end_date {
                bars.push(bar);
            }
        }

        bars.sort_by_key(|b| b.date);
        tracing::debug!(code, exchange, bars = bars.len(), path = %path.display(), "loaded bars");
        Ok(bars)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, TrendsignalError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let suffix = format!("_{}.csv", exchange);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| data_error(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(code) = name.strip_suffix(&suffix) {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
