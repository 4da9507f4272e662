//! Core domain types and decision logic.

pub mod ohlcv;
pub mod position;
pub mod indicator;
pub mod strategy;
pub mod config_validation;
pub mod replay;
pub mod error;
