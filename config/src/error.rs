//! Error types for configuration and manifest loading.
//!
//! Provides a unified error type covering all failure modes: I/O,
//! serialization, invalid manifests, invalid extraction configs, and registry
//! validation.

use std::path::PathBuf;

use thiserror::Error;
use typeroll_core::ValidationError;

/// Errors that can occur while loading workspace configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A `package.json` is missing required fields.
    #[error("invalid manifest '{path}': {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    /// An extraction tool config is missing the entry or output path.
    #[error("invalid extraction config '{path}': {reason}")]
    InvalidExtractionConfig { path: PathBuf, reason: String },

    /// The packages directory produced an ambiguous registry.
    #[error("invalid package registry: {}", format_validation(.0))]
    InvalidRegistry(Vec<ValidationError>),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
