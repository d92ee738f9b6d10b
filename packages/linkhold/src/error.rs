use thiserror::Error;

/// Errors surfaced by link collection operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Empty or malformed client input (empty URL, missing scheme, empty batch).
    #[error("{0}")]
    InvalidInput(String),

    /// The URL is already saved for this user.
    #[error("this URL is already saved for you")]
    Conflict,

    /// Unknown or malformed link identifier.
    #[error("no such link")]
    NotFound,

    /// The underlying store failed or a query errored.
    #[error("storage error: {0}")]
    Store(#[source] anyhow::Error),
}
