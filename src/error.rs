//! Error types for the HipChat notifier

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required field(s): {}", .0.join(", "))]
    MissingRequiredField(Vec<String>),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidOption { name: String, value: String },

    #[error("Config file error: {0}")]
    ConfigFile(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
