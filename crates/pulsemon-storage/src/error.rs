/// Errors that can occur within the storage layer.
///
/// The in-memory engine can only fail through lock poisoning, but the
/// variants leave room for a durable backend behind the same trait.
///
/// # Examples
///
/// ```
/// use pulsemon_storage::error::StorageError;
///
/// let err = StorageError::LockPoisoned;
/// assert!(err.to_string().contains("lock"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A thread panicked while holding the storage lock.
    #[error("storage: lock poisoned by a panicked writer")]
    LockPoisoned,

    /// Generic storage error for cases not covered by other variants.
    #[error("storage: {0}")]
    Other(String),
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
