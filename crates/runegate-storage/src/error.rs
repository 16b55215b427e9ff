//! Error types for the storage layer.

/// Result alias used by every [`Storage`](crate::Storage) method.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors a storage backend can report.
///
/// Absence of a record is not an error; lookups return `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// An update targeted a record that does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// `"user"` or `"shard"`.
        entity: &'static str,
        /// Display form of the missing id.
        id: String,
    },

    /// A create or update would clash with an existing id or username.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
