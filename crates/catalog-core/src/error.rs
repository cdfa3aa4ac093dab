//! Error taxonomy shared by the query engine, favorite toggle, and ingestion.
//!
//! Each variant maps to a distinct status category at the HTTP boundary
//! (bad input, not found, conflict, server error). Store failures keep the
//! underlying [`anyhow::Error`] for logging but are never rendered to callers
//! verbatim.

use thiserror::Error;

/// Result alias for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A request parameter failed validation.
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The referenced catalog entry does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The import was rejected as a whole; nothing was committed.
    #[error("ingestion failed: {0}")]
    Ingestion(String),

    /// The storage backend failed.
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Validation { .. } => "bad_request",
            CatalogError::NotFound(_) => "not_found",
            CatalogError::Conflict(_) => "conflict",
            CatalogError::Ingestion(_) => "ingestion_failed",
            CatalogError::Store(_) => "internal",
        }
    }
}
