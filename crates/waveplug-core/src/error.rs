//! Error types for waveplug-core.

use thiserror::Error;

/// Error type for waveplug-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Buffer allocation failed: {len} elements ({bytes} bytes)")]
    AllocationFailed { len: usize, bytes: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Engine is not operational")]
    NotOperational,

    #[error("Unknown parameter index: {0}")]
    UnknownParameter(usize),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Allocation failure for `len` elements of `T`.
    pub fn allocation<T>(len: usize) -> Self {
        Error::AllocationFailed {
            len,
            bytes: len.saturating_mul(core::mem::size_of::<T>()),
        }
    }
}
