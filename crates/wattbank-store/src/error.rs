//! Error types for wattbank-store.

use std::path::PathBuf;

/// Result type for wattbank-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wattbank-store.
///
/// Store methods never retry or swallow these; they propagate to the
/// application layer, which is the only place that performs compensating
/// action (e.g. rolling back an optimistic balance update).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create the database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
