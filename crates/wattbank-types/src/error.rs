//! Error types for parsing stored enum values.

use thiserror::Error;

/// Errors that can occur when parsing persisted text values back into
/// typed enums.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A stored text value did not match any known variant.
    #[error("unknown {kind} value: {value}")]
    UnknownVariant {
        /// Name of the enum being parsed.
        kind: &'static str,
        /// The offending stored value.
        value: String,
    },
}
