//! Demo EMA strategy: trades the edges of a 10/20 EMA trend filter.
//!
//! RSI(3) is computed and attached as an informational series, but no entry
//! or exit decision reads it, even though the description mentions RSI
//! crossovers.

use std::fmt;

use crate::domain::error::StrategyError;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{Position, Side};
use crate::domain::strategy::{
    AnnotatedWindow, Strategy, ensure_data_length, ensure_open, ensure_portfolio_value,
    pct_change_volatility,
};

const DESCRIPTION: &str = "Demo EMA Strategy\n Buy when RSI crossover 30 within an uptrend;\n Sell when RSI crossunder 70 within an uptrend;";

pub const REQUIRED_DATA_LENGTH: usize = 100;
pub const FAST_WINDOW: usize = 10;
pub const SLOW_WINDOW: usize = 20;
pub const RSI_PERIOD: usize = 3;
pub const VOLATILITY_LOOKBACK: usize = 20;
/// Extra divisor applied to the volatility estimate when sizing.
pub const SIZE_DAMPING: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DemoStrategy {
    risk_factor: f64,
}

impl DemoStrategy {
    pub fn new(risk_factor: f64) -> Result<Self, StrategyError> {
        if !risk_factor.is_finite() || risk_factor <= 0.0 {
            return Err(StrategyError::InvalidConfig {
                key: "risk_factor".to_string(),
                reason: format!("must be a positive number, got {}", risk_factor),
            });
        }
        Ok(Self { risk_factor })
    }

    pub fn risk_factor(&self) -> f64 {
        self.risk_factor
    }
}

/// True when `flags` switched from false to true on the last bar.
fn rising_edge(flags: &[bool]) -> bool {
    match flags {
        [.., prev, last] => *last && !*prev,
        _ => false,
    }
}

impl Strategy for DemoStrategy {
    fn describe(&self) -> &'static str {
        DESCRIPTION
    }

    fn required_data_length(&self) -> usize {
        REQUIRED_DATA_LENGTH
    }

    fn position_size(&self, bars: &[OhlcvBar], portfolio_value: f64) -> Result<f64, StrategyError> {
        ensure_portfolio_value(portfolio_value)?;
        let volatility = pct_change_volatility(bars, VOLATILITY_LOOKBACK)?;
        Ok(self.risk_factor * portfolio_value / (SIZE_DAMPING * volatility))
    }

    fn compute_indicators<'a>(
        &self,
        bars: &'a [OhlcvBar],
    ) -> Result<AnnotatedWindow<'a>, StrategyError> {
        ensure_data_length(bars, REQUIRED_DATA_LENGTH)?;
        let window = AnnotatedWindow::with_trend(
            bars,
            calculate_ema(bars, FAST_WINDOW),
            calculate_ema(bars, SLOW_WINDOW),
        );
        Ok(window.with_informational(calculate_rsi(bars, RSI_PERIOD)))
    }

    fn open_long(&self, window: &AnnotatedWindow<'_>) -> bool {
        rising_edge(window.uptrend())
    }

    fn open_short(&self, window: &AnnotatedWindow<'_>) -> bool {
        rising_edge(window.downtrend())
    }

    fn close_position(
        &self,
        window: &AnnotatedWindow<'_>,
        position: &Position,
    ) -> Result<bool, StrategyError> {
        ensure_open(position)?;
        Ok(match position.side {
            Side::Long => !window.in_uptrend(),
            Side::Short => !window.in_downtrend(),
        })
    }
}

impl fmt::Display for DemoStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(DESCRIPTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorType;
    use crate::domain::position::PositionStatus;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &c)| OhlcvBar::from_close(start + chrono::Duration::days(i as i64), c))
            .collect()
    }

    /// 110 falling bars followed by a steady climb.
    fn v_shape() -> Vec<f64> {
        let mut prices: Vec<f64> = (0..110).map(|i| 300.0 - i as f64).collect();
        let bottom = *prices.last().unwrap();
        prices.extend((1..=40).map(|i| bottom + 2.0 * i as f64));
        prices
    }

    fn first_flip(flags: &[bool], from: usize) -> usize {
        (from..flags.len())
            .find(|&i| flags[i] && !flags[i - 1])
            .unwrap()
    }

    #[test]
    fn rising_edge_detection() {
        assert!(rising_edge(&[false, true]));
        assert!(!rising_edge(&[true, true]));
        assert!(!rising_edge(&[true, false]));
        assert!(!rising_edge(&[true]));
        assert!(!rising_edge(&[]));
    }

    #[test]
    fn rejects_bad_risk_factor() {
        assert!(DemoStrategy::new(0.0).is_err());
        assert!(DemoStrategy::new(-0.1).is_err());
        assert!(DemoStrategy::new(f64::INFINITY).is_err());
        assert_relative_eq!(DemoStrategy::new(0.02).unwrap().risk_factor(), 0.02);
    }

    #[test]
    fn compute_indicators_boundary() {
        let s = DemoStrategy::new(0.01).unwrap();
        let bars = make_bars(&v_shape());
        assert_eq!(
            s.compute_indicators(&bars[..99]).unwrap_err(),
            StrategyError::InsufficientData {
                bars: 99,
                required: 100
            }
        );
        assert!(s.compute_indicators(&bars[..100]).is_ok());
    }

    #[test]
    fn rsi_attached_but_informational() {
        let s = DemoStrategy::new(0.01).unwrap();
        let bars = make_bars(&v_shape());
        let window = s.compute_indicators(&bars).unwrap();

        let rsi = window.indicator(IndicatorType::Rsi(RSI_PERIOD)).unwrap();
        assert_eq!(rsi.len(), bars.len());
        assert!(window.is_informational(IndicatorType::Rsi(RSI_PERIOD)));
        assert!(!window.is_informational(IndicatorType::Ema(FAST_WINDOW)));
    }

    #[test]
    fn opens_long_on_trend_flip_only() {
        let s = DemoStrategy::new(0.01).unwrap();
        let bars = make_bars(&v_shape());
        let full = s.compute_indicators(&bars).unwrap();
        let t = first_flip(full.uptrend(), 100);

        let at_flip = s.compute_indicators(&bars[..=t]).unwrap();
        assert!(s.open_long(&at_flip));
        assert!(!s.open_short(&at_flip));

        assert!(full.uptrend()[t + 1]);
        let after = s.compute_indicators(&bars[..=t + 1]).unwrap();
        assert!(!s.open_long(&after));
    }

    #[test]
    fn opens_short_on_downtrend_flip() {
        let s = DemoStrategy::new(0.01).unwrap();
        let mut prices: Vec<f64> = (0..110).map(|i| 100.0 + i as f64).collect();
        let top = *prices.last().unwrap();
        prices.extend((1..=40).map(|i| top - 2.0 * i as f64));
        let bars = make_bars(&prices);

        let full = s.compute_indicators(&bars).unwrap();
        let t = first_flip(full.downtrend(), 100);
        let at_flip = s.compute_indicators(&bars[..=t]).unwrap();
        assert!(s.open_short(&at_flip));
        assert!(!s.open_long(&at_flip));
    }

    #[test]
    fn sizing_is_damped() {
        let s = DemoStrategy::new(0.001).unwrap();
        let mut prices = vec![100.0];
        for i in 0..30 {
            let last = *prices.last().unwrap();
            prices.push(if i % 2 == 0 { last * 1.01 } else { last * 0.99 });
        }
        let size = s.position_size(&make_bars(&prices), 100_000.0).unwrap();
        assert_relative_eq!(size, 1_000.0, max_relative = 1e-9);
    }

    #[test]
    fn sizing_needs_lookback_bars() {
        let s = DemoStrategy::new(0.001).unwrap();
        let err = s.position_size(&make_bars(&[1.0; 20]), 100.0).unwrap_err();
        assert_eq!(
            err,
            StrategyError::InsufficientData {
                bars: 20,
                required: 21
            }
        );
    }

    #[test]
    fn close_on_trend_loss() {
        let s = DemoStrategy::new(0.01).unwrap();
        let bars = make_bars(&v_shape());
        let window = s.compute_indicators(&bars).unwrap();
        assert!(window.in_uptrend());

        assert!(!s.close_position(&window, &Position::open(Side::Long, 50.0)).unwrap());
        assert!(s.close_position(&window, &Position::open(Side::Short, 0.0)).unwrap());
    }

    #[test]
    fn close_rejects_closed_position() {
        let s = DemoStrategy::new(0.01).unwrap();
        let bars = make_bars(&v_shape());
        let window = s.compute_indicators(&bars).unwrap();
        let pos = Position {
            status: PositionStatus::Closed,
            side: Side::Short,
            drawdown: 0.0,
        };
        assert!(matches!(
            s.close_position(&window, &pos),
            Err(StrategyError::InvalidState { .. })
        ));
    }
}
