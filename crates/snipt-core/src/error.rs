use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SniptError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
    #[error("Messaging error: {0}")]
    Messaging(String),
    #[error("Invalid shortcut '{shortcut}': {reason}")]
    InvalidShortcut { shortcut: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Snippet store not found at: {0}")]
    StoreNotFound(String),
    #[error("Shortcut '{0}' already exists")]
    DuplicateShortcut(String),
    #[error("Snippet '{0}' not found")]
    SnippetNotFound(String),
    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SniptError>;
