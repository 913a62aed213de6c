use std::io;
use thiserror::Error;

/// Exit code for a clean run.
pub const EXIT_OK: i32 = 0;
/// Exit code for an unexpected failure (I/O, malformed JSON, bad config).
pub const EXIT_ERROR: i32 = 1;
/// Exit code when at least one policy violation was found.
pub const EXIT_VIOLATION: i32 = 2;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config parse error: {0}")]
    ConfigError(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    GuideError(String),
    #[error("{0}")]
    ManifestError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl PolicyError {
    /// Every error surfaced to the CLI is an unexpected failure; violations
    /// travel as report data instead.
    pub fn exit_code(&self) -> i32 {
        EXIT_ERROR
    }
}
