use thiserror::Error;

#[derive(Debug, Error)]
pub enum CadenceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CadenceError {
    /// Short error code string used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            CadenceError::Config(_) => "CONFIG_ERROR",
            CadenceError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CadenceError>;
