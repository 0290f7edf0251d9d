use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PinError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid value '{value}' for environment variable {var}")]
    Env { var: String, value: String },

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, PinError>;

impl<T> From<std::sync::PoisonError<T>> for PinError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Store(err.to_string())
    }
}
