//! Domain error types.
//!
//! Decision-time outcomes (empty chain, closed market) are never errors;
//! everything here surfaces at construction or I/O time.

/// Top-level error type for chainroll.
#[derive(Debug, thiserror::Error)]
pub enum ChainrollError {
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

    #[error("contract data error: {reason}")]
    Data { reason: String },

    #[error("order rejected for {symbol}: {reason}")]
    Order { symbol: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChainrollError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ChainrollError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        ChainrollError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    /// Process exit status reported for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ChainrollError::Io(_) => 1,
            ChainrollError::ConfigParse { .. }
            | ChainrollError::ConfigMissing { .. }
            | ChainrollError::ConfigInvalid { .. } => 2,
            ChainrollError::Data { .. } => 3,
            ChainrollError::Order { .. } => 4,
        }
    }
}

impl From<&ChainrollError> for std::process::ExitCode {
    fn from(err: &ChainrollError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
