use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed for '{field}': {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("access policy rejected the operation: {0}")]
    PolicyRejected(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("unexpected domain error: {0}")]
    Unexpected(String),
}
