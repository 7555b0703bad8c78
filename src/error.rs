use thiserror::Error;

/// Deterministic failures raised by the scoring, allocation, projection and
/// ranking engines. None of them are retried.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("division error: {0}")]
    Division(String),
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn insufficient(message: impl Into<String>) -> Self {
        Self::InsufficientData(message.into())
    }

    pub fn division(message: impl Into<String>) -> Self {
        Self::Division(message.into())
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
