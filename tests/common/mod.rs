#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use trendsignal::domain::error::TrendsignalError;
pub use trendsignal::domain::ohlcv::OhlcvBar;
use trendsignal::domain::strategy::{ContractType, TrendFollowingConfig};
use trendsignal::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        _exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TrendsignalError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(TrendsignalError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self, _exchange: &str) -> Result<Vec<String>, TrendsignalError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One bar per day starting 2020-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2020, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        })
        .collect()
}

pub fn rising(count: usize, start_price: f64) -> Vec<f64> {
    (0..count).map(|i| start_price + i as f64).collect()
}

/// Closes whose percentage changes alternate between +pct and -pct.
pub fn alternating(count: usize, pct: f64) -> Vec<f64> {
    let mut closes = vec![100.0];
    for i in 1..count {
        let last = closes[i - 1];
        closes.push(if i % 2 == 1 { last * (1.0 + pct) } else { last * (1.0 - pct) });
    }
    closes
}

/// Slide for `down` bars, then climb for `up` bars, with a small zig-zag.
pub fn v_shape(down: usize, up: usize) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..down)
        .map(|i| 300.0 - i as f64 - (i % 2) as f64 * 0.5)
        .collect();
    let bottom = 300.0 - down as f64;
    closes.extend((1..=up).map(|i| bottom + 2.0 * i as f64 + (i % 2) as f64 * 0.5));
    closes
}

pub fn small_trend_config(contract_type: ContractType) -> TrendFollowingConfig {
    TrendFollowingConfig {
        contract_type,
        risk_factor: 0.001,
        fast_window: 5,
        slow_window: 10,
        std_window: 8,
        breakout_window: 12,
        exit_multiplier: 3.0,
    }
}
