//! Package and dependency type definitions.
//!
//! This module defines the data model shared by the registry, the reference
//! scanner and the closure merger. Descriptors are loaded once from package
//! manifests and never change afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Declaration file suffix used when a file name carries no other hint.
pub const DECLARATION_SUFFIX: &str = ".d.ts";

/// One buildable package in the workspace.
///
/// The `dir_name` is the last segment of `directory` and doubles as the
/// target identifier accepted on the command line and used to name merged
/// declaration files.
///
/// # Examples
///
/// ```
/// use typeroll_core::PackageDescriptor;
///
/// let pkg = PackageDescriptor::new("@acme/utils", "/repo/packages/utils", true);
/// assert_eq!(pkg.dir_name, "utils");
/// assert!(pkg.is_private);
/// assert!(pkg.types.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Package name from the manifest (e.g. `@acme/utils`).
    pub name: String,
    /// Absolute package directory.
    pub directory: PathBuf,
    /// Final segment of `directory`; the target id.
    pub dir_name: String,
    /// Private packages are never published on their own.
    pub is_private: bool,
    /// Declaration entry declared by the manifest (`types` or `typings`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
}

impl PackageDescriptor {
    /// Creates a descriptor, deriving `dir_name` from the directory.
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>, is_private: bool) -> Self {
        let directory = directory.into();
        let dir_name = directory
            .file_name()
            .map(|segment| segment.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name: name.into(),
            directory,
            dir_name,
            is_private,
            types: None,
        }
    }

    /// Sets the declaration entry.
    pub fn with_types(mut self, types: impl Into<String>) -> Self {
        self.types = Some(types.into());
        self
    }

    /// Returns `true` when the package declares a declaration entry.
    pub fn has_types(&self) -> bool {
        self.types.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Builds the edge that points at this package.
    pub fn edge(&self) -> DependencyEdge {
        DependencyEdge {
            pkg_name: self.name.clone(),
            dir_name: self.dir_name.clone(),
            directory: self.directory.clone(),
        }
    }
}

/// A reference from a declaration file to a private package.
///
/// Produced by the reference scanner: the file being merged imports
/// `pkg_name`, whose sources live in `directory`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Package name as written in the module specifier.
    pub pkg_name: String,
    /// Directory segment of the referenced package.
    pub dir_name: String,
    /// Absolute directory of the referenced package.
    pub directory: PathBuf,
}

/// Outcome of one extraction tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub succeeded: bool,
    pub error_count: usize,
    pub warning_count: usize,
}

impl ExtractionOutcome {
    /// A clean, successful run.
    pub fn success() -> Self {
        Self {
            succeeded: true,
            error_count: 0,
            warning_count: 0,
        }
    }

    /// A failed run with the given diagnostic counts.
    pub fn failure(error_count: usize, warning_count: usize) -> Self {
        Self {
            succeeded: false,
            error_count,
            warning_count,
        }
    }
}

/// Splits a declaration file name into its stem and suffix.
///
/// The suffix starts at the first `.` so that `index.d.ts` yields
/// `("index", ".d.ts")`. Names without a dot get [`DECLARATION_SUFFIX`].
///
/// # Examples
///
/// ```
/// use typeroll_core::split_declaration_name;
///
/// assert_eq!(split_declaration_name("garfish.d.ts"), ("garfish", ".d.ts"));
/// assert_eq!(split_declaration_name("core.d.mts"), ("core", ".d.mts"));
/// assert_eq!(split_declaration_name("bare"), ("bare", ".d.ts"));
/// ```
pub fn split_declaration_name(file_name: &str) -> (&str, &str) {
    match file_name.find('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, DECLARATION_SUFFIX),
    }
}

/// Returns the local module name of a declaration file (its stem).
pub fn local_module_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    split_declaration_name(&file_name).0.to_string()
}
