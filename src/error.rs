//! Error type shared by the node tree, repositories and stores.

use std::path::PathBuf;

use thiserror::Error;

use crate::node::ServiceKind;

pub type Result<T, E = RepoError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RepoError {
    /// A public operation was called with an argument it cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A required capability is registered neither on the node nor on any
    /// ancestor. The tree is misconfigured; retrying cannot help.
    #[error("no {0} registered in node chain")]
    ServiceNotFound(ServiceKind),

    #[error("{store} does not support {operation}")]
    Unsupported {
        store: &'static str,
        operation: &'static str,
    },

    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("content stream failed: {0}")]
    Stream(#[from] std::io::Error),

    #[error("content of '{0}' is not valid UTF-8")]
    NotUtf8(String),

    #[error("cannot load config '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl RepoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepoError::Io {
            path: path.into(),
            source,
        }
    }
}
