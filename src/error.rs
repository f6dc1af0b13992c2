use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Cache-tier errors.
///
/// The memory tier only produces [`CacheError::NotAnInteger`] and
/// [`CacheError::InvalidTtl`]; everything else originates at a remote boundary
/// and is expected to be logged and absorbed by the composing layer.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to (de)serialize cached value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("value at '{key}' is not an integer")]
    NotAnInteger { key: String },

    #[error("ttl must be greater than zero")]
    InvalidTtl,

    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Result alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
