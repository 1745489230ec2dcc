use thiserror::Error;

/// Errors raised while interpreting values shared by every layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unsupported component type: {0}")]
    UnsupportedComponent(String),

    #[error("invalid sync token: {0}")]
    InvalidSyncToken(String),

    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
