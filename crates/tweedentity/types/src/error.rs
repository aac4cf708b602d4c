use thiserror::Error;

/// Errors from parsing or validating shared value types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid external id: {0}")]
    InvalidExternalId(String),

    #[error("invalid app nickname: {0}")]
    InvalidNickname(String),

    #[error("invalid app id: must be greater than zero")]
    InvalidAppId,
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
