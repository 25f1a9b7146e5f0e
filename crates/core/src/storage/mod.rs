//! Storage layer.
//!
//! The only persisted state is the write-ahead log; the working set lives
//! entirely in memory and is rebuilt from the log on startup.

/// Append-only write-ahead log with CRC32-guarded framing.
pub mod wal;

pub use wal::{ReplayStats, WriteAheadLog};
