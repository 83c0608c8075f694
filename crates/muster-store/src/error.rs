//! Error types for the store boundary.

/// Errors the persistence boundary can raise.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record with the given identity.
    #[error("no record with id {0}")]
    NotFound(String),

    /// The backing store failed (I/O, corruption, platform database
    /// errors). The message is backend-specific.
    #[error("store backend error: {0}")]
    Backend(String),
}
