//! Error types for merging and build dispatch.

use std::path::PathBuf;

use thiserror::Error;
use typeroll_config::ConfigError;
use typeroll_core::CoreError;

/// Failures of the merge machinery itself.
///
/// An extraction tool that runs and reports errors is *not* a `MergeError`;
/// that outcome is recorded in the [`MergeReport`](crate::MergeReport).
#[derive(Debug, Error)]
pub enum MergeError {
    /// Filesystem I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Workspace configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An extraction job could not be derived.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An external program could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external program exited unsuccessfully.
    #[error("'{program}' exited with {}", describe_code(*.code))]
    ProcessFailed { program: String, code: Option<i32> },

    /// A declaration file expected after extraction is missing.
    #[error("declaration file not found: {0}")]
    MissingDeclaration(PathBuf),
}

/// Failures of a whole build run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The bundler failed for a target.
    #[error("build failed for {target}: {source}")]
    Bundler {
        target: String,
        #[source]
        source: MergeError,
    },

    /// The declaration closure of a target did not merge.
    #[error(
        "type rollup failed for {target}: API Extractor completed with {errors} errors and {warnings} warnings"
    )]
    MergeFailed {
        target: String,
        errors: usize,
        warnings: usize,
        failed_packages: Vec<String>,
    },

    /// Merge machinery failure.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Workspace configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Target resolution failure.
    #[error(transparent)]
    Core(#[from] CoreError),
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Convenience alias for results with [`MergeError`].
pub type Result<T> = std::result::Result<T, MergeError>;
