//! Domain error types.

use crate::domain::position::PositionStatus;

/// Errors raised by the strategy contract itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrategyError {
    #[error("insufficient data: have {bars} bars, need {required}")]
    InsufficientData { bars: usize, required: usize },

    #[error("unable to close a position that is {status}")]
    InvalidState { status: PositionStatus },

    #[error("volatility over the trailing {lookback} bars is zero or not finite")]
    ZeroVolatility { lookback: usize },

    #[error("portfolio value must be finite and non-negative, got {value}")]
    InvalidPortfolioValue { value: f64 },

    #[error("invalid strategy parameter {key}: {reason}")]
    InvalidConfig { key: String, reason: String },
}

/// Top-level error type for trendsignal.
#[derive(Debug, thiserror::Error)]
pub enum TrendsignalError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {code} on {exchange}")]
    NoData { code: String, exchange: String },

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TrendsignalError> for std::process::ExitCode {
    fn from(err: &TrendsignalError) -> Self {
        let code: u8 = match err {
            TrendsignalError::Io(_) => 1,
            TrendsignalError::ConfigParse { .. }
            | TrendsignalError::ConfigMissing { .. }
            | TrendsignalError::ConfigInvalid { .. } => 2,
            TrendsignalError::Data { .. } | TrendsignalError::NoData { .. } => 3,
            TrendsignalError::Strategy(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
