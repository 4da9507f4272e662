//! Configuration validation.
//!
//! Turns an INI source into validated strategy, data and replay settings.
//! Every strategy parameter is required: a missing key is reported, never
//! replaced by a default.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::domain::error::{StrategyError, TrendsignalError};
use crate::domain::strategy::{
    ContractType, DemoStrategy, StrategyKind, TrendFollowingConfig, TrendFollowingStrategy,
};
use crate::ports::config_port::ConfigPort;

const STRATEGY: &str = "strategy";
const DATA: &str = "data";
const REPLAY: &str = "replay";

pub const DEFAULT_PORTFOLIO_VALUE: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub path: PathBuf,
    pub code: String,
    pub exchange: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    pub portfolio_value: f64,
    /// Trailing bars handed to the strategy per step; the full history when None.
    pub window: Option<usize>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            portfolio_value: DEFAULT_PORTFOLIO_VALUE,
            window: None,
        }
    }
}

fn missing(section: &str, key: &str) -> TrendsignalError {
    TrendsignalError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: String) -> TrendsignalError {
    TrendsignalError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, TrendsignalError> {
    config
        .get_string(section, key)
        .ok_or_else(|| missing(section, key))
}

fn require_parsed<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<T, TrendsignalError> {
    let raw = require_string(config, section, key)?;
    raw.parse()
        .map_err(|_| invalid(section, key, format!("expected {}, got '{}'", expected, raw)))
}

/// Lift a construction-time strategy error onto the `[strategy]` section.
fn strategy_invalid(err: StrategyError) -> TrendsignalError {
    match err {
        StrategyError::InvalidConfig { key, reason } => invalid(STRATEGY, &key, reason),
        other => TrendsignalError::Strategy(other),
    }
}

pub fn trend_following_config(
    config: &dyn ConfigPort,
) -> Result<TrendFollowingConfig, TrendsignalError> {
    for key in TrendFollowingConfig::KEYS {
        require_string(config, STRATEGY, key)?;
    }

    let contract_type = require_string(config, STRATEGY, "contract_type")?
        .parse::<ContractType>()
        .map_err(strategy_invalid)?;

    let parsed = TrendFollowingConfig {
        contract_type,
        risk_factor: require_parsed(config, STRATEGY, "risk_factor", "a number")?,
        fast_window: require_parsed(config, STRATEGY, "fast_window", "a whole number of bars")?,
        slow_window: require_parsed(config, STRATEGY, "slow_window", "a whole number of bars")?,
        std_window: require_parsed(config, STRATEGY, "std_window", "a whole number of bars")?,
        breakout_window: require_parsed(
            config,
            STRATEGY,
            "breakout_window",
            "a whole number of bars",
        )?,
        exit_multiplier: require_parsed(config, STRATEGY, "exit_multiplier", "a number")?,
    };
    parsed.validate().map_err(strategy_invalid)?;
    Ok(parsed)
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<StrategyKind, TrendsignalError> {
    let kind = require_string(config, STRATEGY, "kind")?;
    match kind.to_lowercase().as_str() {
        "trend_following" => {
            let parsed = trend_following_config(config)?;
            let strategy = TrendFollowingStrategy::new(parsed).map_err(strategy_invalid)?;
            Ok(strategy.into())
        }
        "demo" => {
            let risk_factor: f64 = require_parsed(config, STRATEGY, "risk_factor", "a number")?;
            let strategy = DemoStrategy::new(risk_factor).map_err(strategy_invalid)?;
            Ok(strategy.into())
        }
        _ => Err(invalid(
            STRATEGY,
            "kind",
            format!("unknown strategy '{}', expected trend_following or demo", kind),
        )),
    }
}

fn optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, TrendsignalError> {
    match config.get_string(DATA, key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(DATA, key, format!("invalid {} format, expected YYYY-MM-DD", key))
            }),
    }
}

/// `code`/`exchange`/`data_dir` overrides take precedence over the file.
pub fn data_config(
    config: &dyn ConfigPort,
    code: Option<&str>,
    exchange: Option<&str>,
    data_dir: Option<&PathBuf>,
) -> Result<DataConfig, TrendsignalError> {
    let path = match data_dir {
        Some(p) => p.clone(),
        None => PathBuf::from(require_string(config, DATA, "path")?),
    };
    let code = match code {
        Some(c) => c.to_string(),
        None => require_string(config, DATA, "code")?,
    };
    let exchange = match exchange {
        Some(e) => e.to_string(),
        None => require_string(config, DATA, "exchange")?,
    };

    let start_date = optional_date(config, "start_date")?.unwrap_or(NaiveDate::MIN);
    let end_date = optional_date(config, "end_date")?.unwrap_or(NaiveDate::MAX);
    if start_date > end_date {
        return Err(invalid(
            DATA,
            "start_date",
            "start_date must not be after end_date".to_string(),
        ));
    }

    Ok(DataConfig {
        path,
        code,
        exchange,
        start_date,
        end_date,
    })
}

/// `required_data_length` is the warm-up of the strategy being replayed; a
/// shorter `window` could never be evaluated.
pub fn replay_config(
    config: &dyn ConfigPort,
    required_data_length: usize,
) -> Result<ReplayConfig, TrendsignalError> {
    let portfolio_value = match config.get_string(REPLAY, "portfolio_value") {
        None => DEFAULT_PORTFOLIO_VALUE,
        Some(raw) => raw.parse::<f64>().map_err(|_| {
            invalid(REPLAY, "portfolio_value", format!("expected a number, got '{}'", raw))
        })?,
    };
    if !portfolio_value.is_finite() || portfolio_value < 0.0 {
        return Err(invalid(
            REPLAY,
            "portfolio_value",
            "portfolio_value must be non-negative".to_string(),
        ));
    }

    let window = match config.get_string(REPLAY, "window") {
        None => None,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                return Err(invalid(
                    REPLAY,
                    "window",
                    format!("expected a positive number of bars, got '{}'", raw),
                ));
            }
        },
    };
    if let Some(n) = window.filter(|&n| n < required_data_length) {
        return Err(invalid(
            REPLAY,
            "window",
            format!(
                "window of {} bars is shorter than the strategy's required {}",
                n, required_data_length
            ),
        ));
    }

    Ok(ReplayConfig {
        portfolio_value,
        window,
    })
}
