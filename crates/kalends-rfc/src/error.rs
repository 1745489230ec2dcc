use thiserror::Error;

/// RFC parsing and validation errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing required property {property} in {component}")]
    MissingProperty {
        component: String,
        property: &'static str,
    },

    #[error("Invalid value for {property}: {value}")]
    InvalidValue { property: String, value: String },

    #[error("Recurrence rule error: {0}")]
    RecurrenceError(String),

    #[error("Unsupported collation: {0}")]
    UnsupportedCollation(String),

    #[error(transparent)]
    CoreError(#[from] kalends_core::error::CoreError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
