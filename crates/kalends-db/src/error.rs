use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Name of the unique constraint guarding one change record per token.
pub const CHANGE_TOKEN_CONSTRAINT: &str = "dav_change_collection_synctoken_key";

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DieselError),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error(transparent)]
    CoreError(#[from] kalends_core::error::CoreError),
}

impl DbError {
    /// A unique constraint rejected the write.
    #[must_use]
    pub fn unique_violation(message: impl Into<String>) -> Self {
        Self::DatabaseError(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(message.into()),
        ))
    }

    /// ## Summary
    /// True when the error means two writers raced for the same sync token.
    ///
    /// Covers serialization failures and violations of
    /// [`CHANGE_TOKEN_CONSTRAINT`]; both are safe to retry.
    #[must_use]
    pub fn is_token_conflict(&self) -> bool {
        match self {
            Self::DatabaseError(DieselError::DatabaseError(
                DatabaseErrorKind::SerializationFailure,
                _,
            )) => true,
            Self::DatabaseError(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                info.constraint_name() == Some(CHANGE_TOKEN_CONSTRAINT)
            }
            _ => false,
        }
    }

    /// True for unique violations other than a token conflict.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
        ) && !self.is_token_conflict()
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
