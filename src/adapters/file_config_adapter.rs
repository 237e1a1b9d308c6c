//! INI file configuration adapter.
//!
//! Reads the `[session]`, `[data]` and `[logging]` sections. Keys are matched
//! case-insensitively; blank values count as unset so the session falls back
//! to its defaults.

use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use tracing::warn;

/// Every `(section, key)` pair a session reads.
pub const KNOWN_KEYS: &[(&str, &str)] = &[
    ("session", "starting_capital"),
    ("session", "initial_reveal"),
    ("session", "ma_periods"),
    ("session", "window_presets"),
    ("data", "source"),
    ("data", "path"),
    ("data", "base_url"),
    ("data", "symbol"),
    ("data", "symbols"),
    ("data", "start_date"),
    ("data", "end_date"),
    ("logging", "level"),
];

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TraderError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self::checked(config, &path.display().to_string()))
    }

    pub fn from_string(content: &str) -> Result<Self, TraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TraderError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self::checked(config, "<string>"))
    }

    /// An adapter with no sections; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }

    fn checked(config: Ini, origin: &str) -> Self {
        let adapter = Self { config };
        for key in adapter.unknown_keys() {
            warn!(file = origin, %key, "ignoring unknown config key");
        }
        adapter
    }

    /// `section.key` entries that no part of a session reads, sorted.
    ///
    /// Usually a typo such as `[session] intial_reveal`, which would
    /// otherwise silently fall back to the default.
    pub fn unknown_keys(&self) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .config
            .get_map_ref()
            .iter()
            .flat_map(|(section, keys)| {
                keys.keys()
                    .filter(|key| {
                        !KNOWN_KEYS
                            .iter()
                            .any(|&(s, k)| s == section.as_str() && k == key.as_str())
                    })
                    .map(move |key| format!("{section}.{key}"))
            })
            .collect();
        unknown.sort();
        unknown
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}
