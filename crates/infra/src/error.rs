use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure, independent of the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was violated (e.g. duplicate email or VIN).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced row does not exist, or a row is still referenced.
    #[error("reference violation: {0}")]
    Reference(String),

    /// A stored value could not be mapped back into the domain.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Connection, pool or other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}
