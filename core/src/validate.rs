//! Registry validation.
//!
//! Catches manifests that would make the closure merger ambiguous: package
//! names are the keys the reference scanner matches on, and directory names
//! are the keys merged declaration files are named after, so both must be
//! unique.
//!
//! # Examples
//!
//! ```
//! use typeroll_core::*;
//!
//! let registry = PackageRegistry::new(vec![
//!     PackageDescriptor::new("a", "/r/a", false),
//!     PackageDescriptor::new("b", "/r/b", true),
//! ]);
//! assert!(validate_registry(&registry).is_empty());
//!
//! let clash = PackageRegistry::new(vec![
//!     PackageDescriptor::new("a", "/r/a", false),
//!     PackageDescriptor::new("a", "/r/b", true),
//! ]);
//! assert!(!validate_registry(&clash).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::PackageRegistry;

/// Registry validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Manifest name is empty or whitespace-only.
    #[error("package in '{0}' has an empty name")]
    EmptyPackageName(String),
    /// Two manifests declare the same package name.
    #[error("duplicate package name: {0}")]
    DuplicatePackageName(String),
    /// Two packages live in directories with the same final segment.
    #[error("duplicate package directory: {0}")]
    DuplicateDirectory(String),
}

/// Validates a registry, returning every problem found.
pub fn validate_registry(registry: &PackageRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut names: HashSet<&str> = HashSet::new();
    let mut dirs: HashSet<&str> = HashSet::new();

    for pkg in registry.iter() {
        let name = pkg.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyPackageName(pkg.dir_name.clone()));
            continue;
        }
        if !names.insert(name) {
            errors.push(ValidationError::DuplicatePackageName(name.to_string()));
        }
        if !dirs.insert(pkg.dir_name.as_str()) {
            errors.push(ValidationError::DuplicateDirectory(pkg.dir_name.clone()));
        }
    }

    errors
}
