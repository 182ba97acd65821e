//! Error types for wattbank-app.

/// Result type for wattbank-app operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the application layer.
///
/// Persistence errors pass through unchanged from the store; the aggregator
/// compensates (rolls back its optimistic update) before re-raising, never
/// swallowing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] wattbank_store::Error),

    /// The remote sync round trip failed; `last_synced` was left unchanged.
    #[error("Sync failed: {0}")]
    Sync(String),

    /// `add_credit` was called with a non-finite amount.
    #[error("Invalid credit amount: {0}")]
    InvalidAmount(f64),

    /// The configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// IO error (e.g. reading the configuration file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
