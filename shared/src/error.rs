//! Error types for Vyndow Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Vyndow Lambda functions.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation error
    #[error("{0}")]
    Validation(String),

    /// Missing or rejected bearer token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Route exists but not for this HTTP method
    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    /// A workflow phase was requested before the previous one was completed
    #[error("PHASE{0}_NOT_COMPLETED")]
    PhaseGate(u8),

    /// Vendor credentials absent from the environment
    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    /// The text-generation model returned something that is not JSON
    #[error("MODEL_OUTPUT_NOT_JSON")]
    ModelOutputNotJson,

    /// The model returned JSON without the fields we need
    #[error("MODEL_OUTPUT_MISSING_FIELDS: {0}")]
    ModelOutputMissingFields(String),

    /// Upstream API answered with an error
    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    /// Network or TLS failure talking to an upstream API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Document store error
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::PhaseGate(_) | Error::MissingCredentials(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::NotFound(_) => 404,
            Error::MethodNotAllowed(_) => 405,
            _ => 500,
        }
    }

    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Error::Upstream {
            service,
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(errors.to_string())
    }
}
