use thiserror::Error;

pub type LciResult<T> = Result<T, LciError>;

#[derive(Error, Debug)]
pub enum LciError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Email delivery error: {0}")]
    Email(String),
}
