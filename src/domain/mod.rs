//! Core domain types and logic.

pub mod error;
pub mod money;
pub mod price_bar;
pub mod price_series;
pub mod reveal_window;
pub mod portfolio;
pub mod trade_engine;
pub mod analytics;
pub mod session;
pub mod seed;
pub mod config_validation;
