//! Package manifest (`package.json`) loading.
//!
//! Only the fields the build cares about are read: the package name, the
//! private flag, and the declaration entry (`types`, or its `typings`
//! alias). Every other field is ignored.
//!
//! # Examples
//!
//! ```
//! use typeroll_config::PackageManifest;
//!
//! let manifest: PackageManifest = serde_json::from_str(r#"{
//!     "name": "@garfish/utils",
//!     "version": "1.0.0",
//!     "private": true,
//!     "typings": "dist/utils.d.ts"
//! }"#).unwrap();
//!
//! assert!(manifest.private);
//! assert_eq!(manifest.declaration_entry(), Some("dist/utils.d.ts"));
//! ```

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use typeroll_core::PackageDescriptor;

use crate::error::{ConfigError, Result};

/// Manifest file name inside every package directory.
pub const MANIFEST_FILE: &str = "package.json";

/// The subset of `package.json` used by the build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Package name.
    #[serde(default)]
    pub name: String,
    /// Private packages are never published on their own.
    #[serde(default)]
    pub private: bool,
    /// Declaration entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
    /// Legacy alias of `types`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typings: Option<String>,
}

impl PackageManifest {
    /// Loads and checks the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// [`JsonError`](ConfigError::JsonError) if it is not valid JSON, or
    /// [`InvalidManifest`](ConfigError::InvalidManifest) if it has no name.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let manifest: PackageManifest = serde_json::from_reader(BufReader::new(file))?;
        if manifest.name.trim().is_empty() {
            return Err(ConfigError::InvalidManifest {
                path: path.to_path_buf(),
                reason: "missing \"name\" field".to_string(),
            });
        }
        Ok(manifest)
    }

    /// Loads `package.json` from a package directory.
    pub fn load_from_dir(package_dir: impl AsRef<Path>) -> Result<Self> {
        Self::load(package_dir.as_ref().join(MANIFEST_FILE))
    }

    /// Declaration entry, preferring `types` over `typings`.
    pub fn declaration_entry(&self) -> Option<&str> {
        self.types.as_deref().or(self.typings.as_deref())
    }

    /// Converts the manifest into a registry descriptor for `package_dir`.
    pub fn into_descriptor(self, package_dir: impl AsRef<Path>) -> PackageDescriptor {
        let types = self.declaration_entry().map(str::to_string);
        let descriptor = PackageDescriptor::new(self.name, package_dir.as_ref(), self.private);
        match types {
            Some(types) => descriptor.with_types(types),
            None => descriptor,
        }
    }
}
