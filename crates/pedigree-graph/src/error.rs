use crate::VertexId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation was applied to a vertex it is not defined for (programming error).
    #[error("precondition violated in `{operation}` for vertex {vertex}")]
    PreconditionViolation {
        operation: &'static str,
        vertex: VertexId,
    },
    /// An input document could not be turned into a pedigree.
    #[error("import failed: {reason}")]
    ImportError { reason: String },
    /// `validate()` found a structural defect after a mutation.
    #[error("graph invariant violated: {detail}")]
    InvariantViolation { detail: String },
    #[error("unsupported layout version {found:?} (expected {expected:?})")]
    UnsupportedVersion { found: String, expected: String },
    #[error("invalid layout option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn precondition(operation: &'static str, vertex: VertexId) -> Self {
        Self::PreconditionViolation { operation, vertex }
    }

    pub fn import(reason: impl Into<String>) -> Self {
        Self::ImportError {
            reason: reason.into(),
        }
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
