//! Error type shared by the pipeline, its collaborators and the HTTP layer.
//!
//! The first four variants are the failure kinds a submission can hit at a
//! collaborator boundary. The rest wrap infrastructure errors from the local
//! adapters. Nothing in the pipeline catches or retries these: the first error
//! aborts the submission and already-completed side effects stay in place.

use std::fmt;

/// What a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Folder,
    File,
    Template,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Folder => "folder",
            ObjectKind::File => "file",
            ObjectKind::Template => "template",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: ObjectKind, id: String },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("notification transport failed: {0}")]
    TransportFailure(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("render error: {0}")]
    Render(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ReportError {
    pub fn not_found(kind: ObjectKind, id: impl Into<String>) -> Self {
        ReportError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
