//! Domain error types.

/// Top-level error type for tradetrainer.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("bar index {index} out of range for series of {len} bars")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no more data: all {len} bars are already revealed")]
    NoMoreData { len: usize },

    #[error("insufficient capital: order costs {required:.2}, capital is {available:.2}")]
    InsufficientCapital { required: f64, available: f64 },

    #[error("insufficient units: requested {requested}, holding {held}")]
    InsufficientUnits { requested: u64, held: u64 },

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("session not ready: {reason}")]
    SessionNotReady { reason: String },

    #[error("invalid command '{input}': {reason}")]
    InvalidCommand { input: String, reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    /// Errors the caller can report and re-prompt on without ending the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TraderError::NoMoreData { .. }
                | TraderError::InsufficientCapital { .. }
                | TraderError::InsufficientUnits { .. }
                | TraderError::InvalidOrder { .. }
                | TraderError::InvalidCommand { .. }
        )
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) | TraderError::Json(_) => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::DataSource { .. } => 3,
            TraderError::InvalidSeries { .. } | TraderError::IndexOutOfRange { .. } => 4,
            TraderError::SessionNotReady { .. }
            | TraderError::NoMoreData { .. }
            | TraderError::InvalidCommand { .. } => 5,
            TraderError::InsufficientCapital { .. }
            | TraderError::InsufficientUnits { .. }
            | TraderError::InvalidOrder { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_errors_are_recoverable() {
        let err = TraderError::InsufficientCapital {
            required: 150_000.0,
            available: 95_000.0,
        };
        assert!(err.is_recoverable());
        assert!(TraderError::InsufficientUnits { requested: 5, held: 0 }.is_recoverable());
        assert!(TraderError::NoMoreData { len: 10 }.is_recoverable());
    }

    #[test]
    fn load_failures_are_not_recoverable() {
        let err = TraderError::InvalidSeries {
            reason: "empty".into(),
        };
        assert!(!err.is_recoverable());
        let err = TraderError::SessionNotReady {
            reason: "loading".into(),
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn insufficient_capital_message_shows_amounts() {
        let err = TraderError::InsufficientCapital {
            required: 150_000.0,
            available: 95_000.0,
        };
        assert_eq!(
            err.to_string(),
            "insufficient capital: order costs 150000.00, capital is 95000.00"
        );
    }
}
