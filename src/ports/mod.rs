//! Port traits at the boundary between the session engine and I/O.

pub mod config_port;
pub mod data_port;
pub mod render_port;
