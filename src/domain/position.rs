//! Position snapshot as seen by a strategy.
//!
//! Positions are owned by the execution layer; strategies only read them.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub status: PositionStatus,
    pub side: Side,
    /// Non-negative adverse excursion in price units.
    pub drawdown: f64,
}

impl Position {
    pub fn open(side: Side, drawdown: f64) -> Self {
        Self {
            status: PositionStatus::Open,
            side,
            drawdown,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }
}

/// Adverse move of `price` relative to `entry_price` for a position on `side`, floored at zero.
pub fn adverse_excursion(side: Side, entry_price: f64, price: f64) -> f64 {
    match side {
        Side::Long => (entry_price - price).max(0.0),
        Side::Short => (price - entry_price).max(0.0),
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStatus::Open => write!(f, "open"),
            PositionStatus::Closed => write!(f, "closed"),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}
