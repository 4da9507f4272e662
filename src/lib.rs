//! trendsignal — entry/exit signals and position sizing for trend strategies.
//!
//! Hexagonal layout: decision logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The [`cli`] drives a strategy
//! over CSV data for inspection.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
