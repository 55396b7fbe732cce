use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no trellis.toml at or above {0}")]
    NotFound(String),

    #[error("invalid trellis.toml: {0}")]
    Invalid(String),

    #[error("unknown capability {0:?} in root_capabilities")]
    UnknownCapability(String),

    #[error("malformed trellis.toml: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
