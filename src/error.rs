//! Error types shared by the projection, filter and sort helpers.
//!
//! Only conditions that indicate a caller or configuration bug are errors.
//! Missing relation metadata and attributes absent from an instance are
//! tolerated by the helpers and never surface here.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The resource is not declared in the domain registry.
    #[error("unknown resource '{resource}'")]
    UnknownResource { resource: String },

    /// A sort string matched neither the field-list syntax nor the literal syntax.
    #[error("invalid sort expression at offset {position}: {message}")]
    SortSyntax { position: usize, message: String },

    /// A `where` document could not be turned into filter clauses.
    #[error("invalid where clause: {0}")]
    InvalidWhere(String),

    /// A `projection` document is not a JSON object.
    #[error("invalid projection: {0}")]
    InvalidProjection(String),

    /// A JSON document could not be turned into a record.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn unknown_resource(resource: impl Into<String>) -> Self {
        Self::UnknownResource {
            resource: resource.into(),
        }
    }

    pub fn sort_syntax(position: usize, message: impl Into<String>) -> Self {
        Self::SortSyntax {
            position,
            message: message.into(),
        }
    }

    pub fn invalid_where(message: impl Into<String>) -> Self {
        Self::InvalidWhere(message.into())
    }

    pub fn invalid_projection(message: impl Into<String>) -> Self {
        Self::InvalidProjection(message.into())
    }

    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord(message.into())
    }
}
