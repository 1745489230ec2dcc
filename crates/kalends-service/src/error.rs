use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] kalends_db::error::DbError),

    #[error(transparent)]
    RfcError(#[from] kalends_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] kalends_core::error::CoreError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(uuid::Uuid),

    #[error("Sync token conflict on collection {0}, retries exhausted")]
    ConcurrentTokenConflict(uuid::Uuid),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unsupported property: {0}")]
    UnsupportedProperty(String),

    #[error("Invalid value for {property}: {value}")]
    InvalidPropertyValue { property: String, value: String },

    #[error("Invalid sync token: {0}")]
    InvalidSyncToken(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
