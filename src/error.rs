use thiserror::Error;

/// Errors surfaced to the user. Variants carry rendered messages so they can
/// cross task boundaries inside an `Action`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl AppError {
    /// Short heading used by the error popup.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Network(_) => "Network error",
            AppError::NotFound(_) => "Not found",
            AppError::Decode(_) => "Decode error",
            AppError::Api { .. } => "API error",
            AppError::Config(_) => "Configuration error",
            AppError::Io(_) => "IO error",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
