//! Port traits the CLI depends on; adapters implement them.

pub mod config_port;
pub mod data_port;
