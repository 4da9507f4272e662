//! Bar-by-bar signal replay.
//!
//! Plays the role of the upstream trading loop for inspection: it walks a
//! price history, feeds each trailing window to a strategy and records the
//! decisions. It holds at most one position and does no PnL accounting.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::error::StrategyError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{Position, Side, adverse_excursion};
use crate::domain::strategy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    OpenLong,
    OpenShort,
    Close,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::OpenLong => write!(f, "open_long"),
            Signal::OpenShort => write!(f, "open_short"),
            Signal::Close => write!(f, "close"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: Signal,
    pub side: Side,
    /// Position size for opening signals.
    pub size: Option<f64>,
    /// Adverse excursion at the time of a close signal.
    pub drawdown: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct OpenTrade {
    side: Side,
    entry_price: f64,
}

fn step_window(bars: &[OhlcvBar], index: usize, window: Option<usize>) -> &[OhlcvBar] {
    let start = match window {
        Some(n) => (index + 1).saturating_sub(n),
        None => 0,
    };
    &bars[start..=index]
}

/// Replay `strategy` over `bars`, oldest first.
///
/// `window` caps the number of trailing bars per step; it must be at least
/// the strategy's required data length or every step fails. Entries whose
/// sizing hits zero volatility are skipped. Any other strategy error aborts
/// the replay.
pub fn replay<S: Strategy + ?Sized>(
    strategy: &S,
    bars: &[OhlcvBar],
    portfolio_value: f64,
    window: Option<usize>,
) -> Result<Vec<SignalEvent>, StrategyError> {
    let required = strategy.required_data_length();
    let mut events = Vec::new();
    let mut open: Option<OpenTrade> = None;

    if bars.len() < required {
        return Ok(events);
    }

    for index in (required.max(1) - 1)..bars.len() {
        let slice = step_window(bars, index, window);
        let annotated = strategy.compute_indicators(slice)?;
        let bar = &bars[index];

        match open {
            Some(trade) => {
                let drawdown = adverse_excursion(trade.side, trade.entry_price, bar.close);
                let position = Position::open(trade.side, drawdown);
                if strategy.close_position(&annotated, &position)? {
                    events.push(SignalEvent {
                        date: bar.date,
                        close: bar.close,
                        signal: Signal::Close,
                        side: trade.side,
                        size: None,
                        drawdown: Some(drawdown),
                    });
                    open = None;
                }
            }
            None => {
                let entry = if strategy.open_long(&annotated) {
                    Some((Signal::OpenLong, Side::Long))
                } else if strategy.open_short(&annotated) {
                    Some((Signal::OpenShort, Side::Short))
                } else {
                    None
                };

                if let Some((signal, side)) = entry {
                    let size = match strategy.position_size(slice, portfolio_value) {
                        Ok(size) => size,
                        Err(StrategyError::ZeroVolatility { .. }) => continue,
                        Err(e) => return Err(e),
                    };
                    events.push(SignalEvent {
                        date: bar.date,
                        close: bar.close,
                        signal,
                        side,
                        size: Some(size),
                        drawdown: None,
                    });
                    open = Some(OpenTrade {
                        side,
                        entry_price: bar.close,
                    });
                }
            }
        }
    }

    Ok(events)
}
