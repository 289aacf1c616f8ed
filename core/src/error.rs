//! Error types for registry and extraction-job operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the core data model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The entry point has no directory segment to substitute.
    #[error("entry point '{path}' has no directory segment named '{segment}'")]
    MissingSegment { path: PathBuf, segment: String },

    /// The output path has no file name to rename.
    #[error("output path '{0}' has no file name")]
    MissingFileName(PathBuf),

    /// A target pattern matched no package.
    #[error("target '{0}' not found")]
    TargetNotFound(String),
}

/// Convenience alias for results with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
