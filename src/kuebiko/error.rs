use thiserror::Error;

#[derive(Error, Debug)]
pub enum KuebikoError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),
}

impl KuebikoError {
    /// True for failures of the underlying storage medium.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            KuebikoError::Io(_) | KuebikoError::Serialization(_) | KuebikoError::Store(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, KuebikoError>;
