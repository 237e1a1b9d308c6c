//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_adapter;
#[cfg(feature = "http")]
pub mod http_adapter;
pub mod json_render_adapter;
pub mod svg_render_adapter;
