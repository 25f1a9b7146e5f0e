//! Crate-wide error type.
//!
//! Validation errors (`EmptyVector`, `ZeroMagnitude`, `DimensionMismatch`,
//! `DuplicateId`) carry no side effects and are surfaced to the caller.
//! `Io` wraps write-ahead-log syscall failures.

use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A vector with zero components was supplied.
    #[error("empty vector")]
    EmptyVector,

    /// The vector's L2 norm is zero, so it has no direction.
    #[error("zero-magnitude vector")]
    ZeroMagnitude,

    /// The two operands have different numbers of components.
    #[error("vector dimensions do not match")]
    DimensionMismatch,

    /// An insert reused an external id that is already present.
    #[error("vector with id {0:?} already exists")]
    DuplicateId(String),

    /// The external id does not fit the WAL's two-byte key-length field.
    #[error("id is {0} bytes, exceeding the 65535-byte limit")]
    IdTooLong(usize),

    /// A write-ahead-log syscall failed.
    #[error("wal i/o: {0}")]
    Io(#[from] io::Error),
}
