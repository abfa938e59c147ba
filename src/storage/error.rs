use thiserror::Error;

/// Errors surfaced by the store operations.
///
/// Persistence failures are deliberately absent: they are logged by the
/// persistence worker and never fail an insert (see `PersistenceError`).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lookup miss, for callers that want a `Result` instead of an `Option`.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A custom key is already bound to a URL.
    #[error("key already exists: {0}")]
    KeyConflict(String),

    #[error("url must not be empty")]
    EmptyUrl,

    /// The allocation counter cannot advance any further.
    #[error("key space exhausted at counter {0}")]
    KeySpaceExhausted(u64),

    /// The operation is not available on this kind of store.
    #[error("{0} is not supported by this store")]
    Unsupported(&'static str),

    /// The remote store could not be reached or did not answer in time.
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote store answered, but with an application-level failure.
    #[error("remote store rejected the request: {0}")]
    Remote(String),

    /// The shared write secret did not match.
    #[error("forbidden")]
    Forbidden,
}

pub type StoreResult<T> = Result<T, StoreError>;
