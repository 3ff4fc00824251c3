//! Error types for audiodump
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the audiodump application
#[derive(Error, Debug)]
pub enum AudiodumpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the container writer and dumper.
///
/// All of these are non-fatal for the process: a rejected open or a dropped
/// batch leaves the writer's payload bookkeeping untouched.
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("A dump file is already open; the header for '{path}' will not be written.")]
    AlreadyOpen { path: PathBuf },

    #[error("The file '{path}' could not be opened for writing. Check if it's already opened by another program.")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Declined to delete the existing file '{path}'.")]
    OverwriteDeclined { path: PathBuf },

    #[error("No dump file is open.")]
    NotOpen,

    #[error("Batch of {frames} frames exceeds the conversion buffer ({capacity} frames); batch dropped.")]
    BufferTooSmall { frames: usize, capacity: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AudiodumpError
pub type Result<T> = std::result::Result<T, AudiodumpError>;
