//! tradetrainer: paper-trading practice on historical daily prices.
//!
//! A session reveals a price series one bar at a time while the player buys
//! and sells against the latest close. Hexagonal architecture: domain logic in
//! [`domain`], port traits in [`ports`], concrete implementations in
//! [`adapters`], command-line dispatch in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
