//! Domain error types.

/// Top-level error type for rsitrader.
#[derive(Debug, thiserror::Error)]
pub enum RsitraderError {
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

    #[error("no session data for {code} on {date}")]
    NoData { code: String, date: String },

    #[error("insufficient data for {code} on {date}: have {samples} samples, need {minimum}")]
    InsufficientData {
        code: String,
        date: String,
        samples: usize,
        minimum: usize,
    },

    #[error("bad data at {context}: {reason}")]
    Data { context: String, reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RsitraderError> for std::process::ExitCode {
    fn from(err: &RsitraderError) -> Self {
        let code: u8 = match err {
            RsitraderError::Io(_) => 1,
            RsitraderError::ConfigParse { .. }
            | RsitraderError::ConfigMissing { .. }
            | RsitraderError::ConfigInvalid { .. } => 2,
            RsitraderError::Storage { .. } => 3,
            RsitraderError::Data { .. } => 4,
            RsitraderError::NoData { .. } | RsitraderError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
