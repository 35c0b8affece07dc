//! Error types for folder-humanizer operations.
//!
//! Defines error types for the subsystems that can fail:
//! - Generation requests against the paraphrasing model
//! - Folder processing (reading sources, writing humanized outputs)
//! - The interactive prompt session

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during generation requests.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse generation response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Model '{model}' is still loading (estimated {estimated_time:.0}s)")]
    ModelLoading { model: String, estimated_time: f64 },

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Generation returned no candidates")]
    EmptyResponse,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Errors that can occur while humanizing a folder.
#[derive(Debug, Error)]
pub enum FolderError {
    #[error("Failed to list folder '{}': {source}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to humanize '{}': {source}", path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: LlmError,
    },

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write progress output: {0}")]
    Console(#[source] std::io::Error),
}

/// Errors that end an interactive session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Folder(#[from] FolderError),
}
