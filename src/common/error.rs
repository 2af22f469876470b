//! Error types for the conformance CLI
//!
//! Only configuration-phase problems surface as `Error` values: anything
//! that happens inside a test step is converted into a ledger entry at the
//! step boundary and never aborts the run.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the conformance CLI
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("No API token. Pass --token, set CONFORM_TOKEN, or configure token_command")]
    MissingToken,

    #[error("Token command '{command}' failed: {reason}")]
    TokenCommandFailed { command: String, reason: String },

    // === External Tool Errors ===
    #[error("Required external tool '{0}' not found in PATH")]
    ToolMissing(String),

    // === Output Directory Errors ===
    #[error("Failed to prepare output directory '{path}': {error}")]
    OutputDir { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an output directory error
    pub fn output_dir(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::OutputDir {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Process exit code for this error
    ///
    /// Configuration problems exit with 2; a missing external tool exits
    /// with 127, matching shell conventions.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ToolMissing(_) => 127,
            _ => 2,
        }
    }
}
