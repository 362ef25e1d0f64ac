use thiserror::Error;

/// Failure reported by a host fact source.
#[derive(Debug, Error)]
pub enum FactError {
    #[error("Fact {fact} unavailable: {reason}")]
    Unavailable { fact: &'static str, reason: String },

    #[error("Invalid value for fact {fact}: {value}")]
    InvalidValue { fact: &'static str, value: String },

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum NodeInfoError {
    #[error("Unknown NodeInfo version: {0}")]
    UnknownVersion(String),

    #[error("Fact provider error: {0}")]
    FactProvider(#[from] FactError),

    #[error("Version {version} is already registered by {existing}, refusing {contender}")]
    DuplicateRegistration {
        version: String,
        existing: String,
        contender: String,
    },

    #[error("Contribution to {point} must be {expected}")]
    InvalidContribution {
        point: &'static str,
        expected: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NodeInfoError {
    /// Whether the failure was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, NodeInfoError::UnknownVersion(_))
    }
}

pub type Result<T> = std::result::Result<T, NodeInfoError>;
