//! Error types for the collection manager

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtgError {
    #[error("Invalid card record: {0}")]
    InvalidCard(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Card lookup failed: {0}")]
    Lookup(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, MtgError>;
