//! Strategy contract and the indicator-annotated window it operates on.
//!
//! Every strategy is a pure decision function over a trailing price window:
//! `compute_indicators` derives the series it needs, the `open_*` and
//! `close_position` predicates read the most recent bars of that annotated
//! window, and `position_size` turns a portfolio value into a size scaled by
//! recent volatility. Strategies hold only immutable configuration, so a
//! single instance can be shared across threads.

pub mod demo;
pub mod trend_following;

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::domain::error::StrategyError;
use crate::domain::indicator::volatility::{pct_changes, population_std, trailing};
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::Position;

pub use demo::DemoStrategy;
pub use trend_following::{ContractType, TrendFollowingConfig, TrendFollowingStrategy};

pub trait Strategy: Send + Sync {
    /// Human-readable identity of the rule set.
    fn describe(&self) -> &'static str;

    /// Minimum window length accepted by [`Strategy::compute_indicators`].
    fn required_data_length(&self) -> usize;

    fn position_size(&self, bars: &[OhlcvBar], portfolio_value: f64) -> Result<f64, StrategyError>;

    fn compute_indicators<'a>(
        &self,
        bars: &'a [OhlcvBar],
    ) -> Result<AnnotatedWindow<'a>, StrategyError>;

    fn open_long(&self, window: &AnnotatedWindow<'_>) -> bool;

    fn open_short(&self, window: &AnnotatedWindow<'_>) -> bool;

    /// Errors with [`StrategyError::InvalidState`] unless the position is open.
    fn close_position(
        &self,
        window: &AnnotatedWindow<'_>,
        position: &Position,
    ) -> Result<bool, StrategyError>;
}

/// A price window together with the indicator series derived from it.
///
/// All series are aligned index-for-index with the bars. `uptrend` and
/// `downtrend` are complementary on every bar.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedWindow<'a> {
    bars: &'a [OhlcvBar],
    indicators: HashMap<IndicatorType, IndicatorSeries>,
    informational: HashSet<IndicatorType>,
    uptrend: Vec<bool>,
    downtrend: Vec<bool>,
}

impl<'a> AnnotatedWindow<'a> {
    /// Dual moving-average trend filter: uptrend while fast >= slow.
    pub(crate) fn with_trend(
        bars: &'a [OhlcvBar],
        fast: IndicatorSeries,
        slow: IndicatorSeries,
    ) -> Self {
        let uptrend: Vec<bool> = fast
            .values
            .iter()
            .zip(&slow.values)
            .map(|(f, s)| f.value >= s.value)
            .collect();
        let downtrend = uptrend.iter().map(|up| !up).collect();

        let mut indicators = HashMap::new();
        indicators.insert(fast.indicator_type, fast);
        indicators.insert(slow.indicator_type, slow);

        Self {
            bars,
            indicators,
            informational: HashSet::new(),
            uptrend,
            downtrend,
        }
    }

    /// Attach a series that no decision function reads.
    pub(crate) fn with_informational(mut self, series: IndicatorSeries) -> Self {
        self.informational.insert(series.indicator_type);
        self.indicators.insert(series.indicator_type, series);
        self
    }

    pub fn bars(&self) -> &'a [OhlcvBar] {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn indicator(&self, indicator_type: IndicatorType) -> Option<&IndicatorSeries> {
        self.indicators.get(&indicator_type)
    }

    /// True for series attached for inspection only.
    pub fn is_informational(&self, indicator_type: IndicatorType) -> bool {
        self.informational.contains(&indicator_type)
    }

    pub fn uptrend(&self) -> &[bool] {
        &self.uptrend
    }

    pub fn downtrend(&self) -> &[bool] {
        &self.downtrend
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    pub fn in_uptrend(&self) -> bool {
        self.uptrend.last().copied().unwrap_or(false)
    }

    pub fn in_downtrend(&self) -> bool {
        self.downtrend.last().copied().unwrap_or(false)
    }

    /// Highest close over the last `n` bars, current bar included.
    pub fn trailing_max_close(&self, n: usize) -> Option<f64> {
        self.trailing_bars(n).iter().map(|b| b.close).reduce(f64::max)
    }

    /// Lowest close over the last `n` bars, current bar included.
    pub fn trailing_min_close(&self, n: usize) -> Option<f64> {
        self.trailing_bars(n).iter().map(|b| b.close).reduce(f64::min)
    }

    fn trailing_bars(&self, n: usize) -> &'a [OhlcvBar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }
}

pub(crate) fn ensure_data_length(bars: &[OhlcvBar], required: usize) -> Result<(), StrategyError> {
    if bars.len() < required {
        return Err(StrategyError::InsufficientData {
            bars: bars.len(),
            required,
        });
    }
    Ok(())
}

pub(crate) fn ensure_open(position: &Position) -> Result<(), StrategyError> {
    if !position.is_open() {
        return Err(StrategyError::InvalidState {
            status: position.status,
        });
    }
    Ok(())
}

/// Population std-dev of the last `lookback` percentage close changes.
///
/// Needs `lookback + 1` bars. A zero or non-finite estimate is an error
/// so sizing never divides by it.
pub fn pct_change_volatility(bars: &[OhlcvBar], lookback: usize) -> Result<f64, StrategyError> {
    ensure_data_length(bars, lookback + 1)?;
    let changes = pct_changes(bars);
    match population_std(trailing(&changes, lookback)) {
        Some(std) if std > 0.0 && std.is_finite() => Ok(std),
        _ => Err(StrategyError::ZeroVolatility { lookback }),
    }
}

pub(crate) fn ensure_portfolio_value(portfolio_value: f64) -> Result<(), StrategyError> {
    if !portfolio_value.is_finite() || portfolio_value < 0.0 {
        return Err(StrategyError::InvalidPortfolioValue {
            value: portfolio_value,
        });
    }
    Ok(())
}

/// The concrete strategies as one statically dispatched type.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyKind {
    TrendFollowing(TrendFollowingStrategy),
    Demo(DemoStrategy),
}

impl Strategy for StrategyKind {
    fn describe(&self) -> &'static str {
        match self {
            StrategyKind::TrendFollowing(s) => s.describe(),
            StrategyKind::Demo(s) => s.describe(),
        }
    }

    fn required_data_length(&self) -> usize {
        match self {
            StrategyKind::TrendFollowing(s) => s.required_data_length(),
            StrategyKind::Demo(s) => s.required_data_length(),
        }
    }

    fn position_size(&self, bars: &[OhlcvBar], portfolio_value: f64) -> Result<f64, StrategyError> {
        match self {
            StrategyKind::TrendFollowing(s) => s.position_size(bars, portfolio_value),
            StrategyKind::Demo(s) => s.position_size(bars, portfolio_value),
        }
    }

    fn compute_indicators<'a>(
        &self,
        bars: &'a [OhlcvBar],
    ) -> Result<AnnotatedWindow<'a>, StrategyError> {
        match self {
            StrategyKind::TrendFollowing(s) => s.compute_indicators(bars),
            StrategyKind::Demo(s) => s.compute_indicators(bars),
        }
    }

    fn open_long(&self, window: &AnnotatedWindow<'_>) -> bool {
        match self {
            StrategyKind::TrendFollowing(s) => s.open_long(window),
            StrategyKind::Demo(s) => s.open_long(window),
        }
    }

    fn open_short(&self, window: &AnnotatedWindow<'_>) -> bool {
        match self {
            StrategyKind::TrendFollowing(s) => s.open_short(window),
            StrategyKind::Demo(s) => s.open_short(window),
        }
    }

    fn close_position(
        &self,
        window: &AnnotatedWindow<'_>,
        position: &Position,
    ) -> Result<bool, StrategyError> {
        match self {
            StrategyKind::TrendFollowing(s) => s.close_position(window, position),
            StrategyKind::Demo(s) => s.close_position(window, position),
        }
    }
}

impl From<TrendFollowingStrategy> for StrategyKind {
    fn from(s: TrendFollowingStrategy) -> Self {
        StrategyKind::TrendFollowing(s)
    }
}

impl From<DemoStrategy> for StrategyKind {
    fn from(s: DemoStrategy) -> Self {
        StrategyKind::Demo(s)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
