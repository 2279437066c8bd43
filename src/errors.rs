use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for OrganoidQuant
#[derive(Error, Debug)]
pub enum OrganoidError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoad {
        source: toml::de::Error,
        path: PathBuf,
    },

    #[error("Expected {expected} channels but the stack has {found}")]
    MissingChannels {
        expected: usize,
        found: usize,
    },

    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Channel {channel} is {found:?} pixels but the stack is {expected:?}")]
    DimensionMismatch {
        channel: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, OrganoidError>;
