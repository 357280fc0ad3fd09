//! Error types for pixport-archive.

use thiserror::Error;

/// Result type for pixport-archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pixport-archive operations.
///
/// Every variant is a caller-contract violation: the writer never recovers
/// by renaming, truncating, or dropping data.
#[derive(Debug, Error)]
pub enum Error {
    /// An entry with this name was already added. Callers resolve name
    /// conflicts before the writer sees them.
    #[error("Duplicate entry name: {0}")]
    DuplicateEntry(String),

    /// Entry name does not fit the 2-byte length field.
    #[error("Entry name too long: {length} bytes (limit {limit})")]
    NameTooLong { length: usize, limit: usize },

    /// Entry payload does not fit the 4-byte size fields.
    #[error("Entry too large: {name} is {size} bytes (limit {limit})")]
    EntryTooLarge {
        name: String,
        size: u64,
        limit: u64,
    },

    /// The archive would grow past what the 4-byte offset fields can record.
    #[error("Archive too large: {projected} bytes (limit {limit})")]
    ArchiveTooLarge { projected: u64, limit: u64 },

    /// More entries than the 2-byte count fields can record.
    #[error("Too many entries: limit is {limit}")]
    TooManyEntries { limit: usize },
}
