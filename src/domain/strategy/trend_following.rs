//! Dual-EMA trend following with breakout entries and a volatility stop.
//!
//! Entries require the trend filter to agree with a fresh breakout: the last
//! close must equal the extreme close of the trailing breakout window. Exits
//! fire when the trend flips against the position or the drawdown exceeds
//! `exit_multiplier` standard deviations of recent close-to-close moves.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::StrategyError;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::volatility::{diffs, sample_std, trailing};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{Position, Side};
use crate::domain::strategy::{
    AnnotatedWindow, Strategy, ensure_data_length, ensure_open, ensure_portfolio_value,
    pct_change_volatility,
};

const DESCRIPTION: &str =
    "Future Trend Following Strategy\nintroduced by Andreas Clenow in his Trading Evolved book";

/// Directions a strategy is allowed to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractType {
    Long,
    Short,
    Both,
}

impl ContractType {
    pub fn allows_long(self) -> bool {
        matches!(self, ContractType::Long | ContractType::Both)
    }

    pub fn allows_short(self) -> bool {
        matches!(self, ContractType::Short | ContractType::Both)
    }
}

impl FromStr for ContractType {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" => Ok(ContractType::Long),
            "short" => Ok(ContractType::Short),
            "both" => Ok(ContractType::Both),
            other => Err(StrategyError::InvalidConfig {
                key: "contract_type".to_string(),
                reason: format!("expected long, short or both, got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractType::Long => write!(f, "long"),
            ContractType::Short => write!(f, "short"),
            ContractType::Both => write!(f, "both"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendFollowingConfig {
    pub contract_type: ContractType,
    pub risk_factor: f64,
    pub fast_window: usize,
    pub slow_window: usize,
    pub std_window: usize,
    pub breakout_window: usize,
    pub exit_multiplier: f64,
}

impl TrendFollowingConfig {
    /// Parameter names, all required when read from a config source.
    pub const KEYS: [&'static str; 7] = [
        "contract_type",
        "risk_factor",
        "fast_window",
        "slow_window",
        "std_window",
        "breakout_window",
        "exit_multiplier",
    ];

    pub fn validate(&self) -> Result<(), StrategyError> {
        let windows = [
            ("fast_window", self.fast_window),
            ("slow_window", self.slow_window),
            ("std_window", self.std_window),
            ("breakout_window", self.breakout_window),
        ];
        for (key, value) in windows {
            if value == 0 {
                return Err(StrategyError::InvalidConfig {
                    key: key.to_string(),
                    reason: "window must be at least 1 bar".to_string(),
                });
            }
        }
        for (key, value) in [
            ("risk_factor", self.risk_factor),
            ("exit_multiplier", self.exit_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(StrategyError::InvalidConfig {
                    key: key.to_string(),
                    reason: format!("must be a positive number, got {}", value),
                });
            }
        }
        Ok(())
    }

    /// Three times the longest window, as a warm-up margin for EMA convergence.
    pub fn required_data_length(&self) -> usize {
        3 * self
            .fast_window
            .max(self.slow_window)
            .max(self.std_window)
            .max(self.breakout_window)
    }
}

impl Default for TrendFollowingConfig {
    fn default() -> Self {
        Self {
            contract_type: ContractType::Both,
            risk_factor: 0.001,
            fast_window: 40,
            slow_window: 80,
            std_window: 40,
            breakout_window: 50,
            exit_multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendFollowingStrategy {
    config: TrendFollowingConfig,
    required_data_length: usize,
}

impl TrendFollowingStrategy {
    pub fn new(config: TrendFollowingConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: TrendFollowingConfig) -> Self {
        let required_data_length = config.required_data_length();
        Self {
            config,
            required_data_length,
        }
    }

    pub fn config(&self) -> &TrendFollowingConfig {
        &self.config
    }
}

impl Default for TrendFollowingStrategy {
    fn default() -> Self {
        Self::from_valid(TrendFollowingConfig::default())
    }
}

impl Strategy for TrendFollowingStrategy {
    fn describe(&self) -> &'static str {
        DESCRIPTION
    }

    fn required_data_length(&self) -> usize {
        self.required_data_length
    }

    fn position_size(&self, bars: &[OhlcvBar], portfolio_value: f64) -> Result<f64, StrategyError> {
        ensure_portfolio_value(portfolio_value)?;
        let volatility = pct_change_volatility(bars, self.config.std_window)?;
        Ok(self.config.risk_factor * portfolio_value / volatility)
    }

    fn compute_indicators<'a>(
        &self,
        bars: &'a [OhlcvBar],
    ) -> Result<AnnotatedWindow<'a>, StrategyError> {
        ensure_data_length(bars, self.required_data_length)?;
        Ok(AnnotatedWindow::with_trend(
            bars,
            calculate_ema(bars, self.config.fast_window),
            calculate_ema(bars, self.config.slow_window),
        ))
    }

    fn open_long(&self, window: &AnnotatedWindow<'_>) -> bool {
        if !self.config.contract_type.allows_long() || !window.in_uptrend() {
            return false;
        }
        match (window.last_close(), window.trailing_max_close(self.config.breakout_window)) {
            (Some(close), Some(high)) => close == high,
            _ => false,
        }
    }

    fn open_short(&self, window: &AnnotatedWindow<'_>) -> bool {
        if !self.config.contract_type.allows_short() || !window.in_downtrend() {
            return false;
        }
        match (window.last_close(), window.trailing_min_close(self.config.breakout_window)) {
            (Some(close), Some(low)) => close == low,
            _ => false,
        }
    }

    fn close_position(
        &self,
        window: &AnnotatedWindow<'_>,
        position: &Position,
    ) -> Result<bool, StrategyError> {
        ensure_open(position)?;

        let moves = diffs(window.bars());
        let stop_hit = sample_std(trailing(&moves, self.config.std_window))
            .is_some_and(|std| position.drawdown >= self.config.exit_multiplier * std);
        if stop_hit {
            return Ok(true);
        }

        Ok(match position.side {
            Side::Long => !window.in_uptrend(),
            Side::Short => !window.in_downtrend(),
        })
    }
}

impl fmt::Display for TrendFollowingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(DESCRIPTION)
    }
}
