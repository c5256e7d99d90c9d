use std::io;

use thiserror::Error;

/// Errors produced by the render and query pipeline. Everything here maps to
/// a well-defined HTML response in the server layer; nothing should take the
/// process down for a single request.
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("post {name} does not exist")]
    PageNotExist { name: String },

    #[error("metadata key '{key}' not present in {file}")]
    MetaKeyMissing { key: String, file: String },

    #[error("invalid page parameter '{value}': expected a positive integer")]
    InvalidPageParam { value: String },

    #[error("markdown rendering failed for {name}: {reason}")]
    Markdown { name: String, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl BlogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogError::PageNotExist { .. })
    }
}
