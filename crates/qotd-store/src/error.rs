//! Error types for the store.

use thiserror::Error;

/// Errors returned by store handle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store task is no longer running (channel closed).
    #[error("store unavailable")]
    Unavailable,
    /// The key holds a different kind of value than the operation expects.
    #[error("key holds the wrong kind of value")]
    WrongType,
}
