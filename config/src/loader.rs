//! Workspace loading: build config plus the package registry.
//!
//! The registry is built by scanning the packages directory for immediate
//! subdirectories that contain a `package.json`. Directories without a
//! manifest are skipped, not rejected, so scratch folders next to packages
//! do not break the build.
//!
//! ```no_run
//! use typeroll_config::Workspace;
//!
//! let workspace = Workspace::load(".", None).unwrap();
//! for target in workspace.registry.public_targets() {
//!     println!("{target}");
//! }
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;
use typeroll_core::{ExtractionConfig, PackageDescriptor, PackageRegistry, validate_registry};

use crate::config::{BuildConfig, DEFAULT_CONFIG_FILE};
use crate::error::{ConfigError, Result};
use crate::extraction::load_extraction_config;
use crate::manifest::{MANIFEST_FILE, PackageManifest};

/// Scans `packages_dir` and builds a validated registry.
///
/// # Errors
///
/// Returns [`IoError`](ConfigError::IoError) if the directory cannot be
/// read, any manifest loading error, or
/// [`InvalidRegistry`](ConfigError::InvalidRegistry) when names or
/// directories collide.
pub fn load_registry(packages_dir: impl AsRef<Path>) -> Result<PackageRegistry> {
    let packages_dir = packages_dir.as_ref();
    let mut packages = Vec::new();

    for entry in std::fs::read_dir(packages_dir)? {
        let entry = entry?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        if !dir.join(MANIFEST_FILE).is_file() {
            debug!(dir = %dir.display(), "Skipping directory without package.json");
            continue;
        }
        let manifest = PackageManifest::load_from_dir(&dir)?;
        packages.push(manifest.into_descriptor(&dir));
    }

    let registry = PackageRegistry::new(packages);
    let errors = validate_registry(&registry);
    if !errors.is_empty() {
        return Err(ConfigError::InvalidRegistry(errors));
    }

    debug!(
        dir = %packages_dir.display(),
        packages = registry.len(),
        "Loaded package registry"
    );
    Ok(registry)
}

/// Everything a build needs to know about the repository on disk.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Workspace root; external tools run from here.
    pub root: PathBuf,
    /// Build configuration.
    pub config: BuildConfig,
    /// All packages, public and private.
    pub registry: PackageRegistry,
}

impl Workspace {
    /// Loads the config (explicit path, or `typeroll.yml` in `root` when
    /// present) and scans the packages directory.
    pub fn load(root: impl AsRef<Path>, config_path: Option<&Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config = match config_path {
            Some(path) => BuildConfig::load(path)?,
            None => BuildConfig::load_or_default(root.join(DEFAULT_CONFIG_FILE))?,
        };
        Self::with_config(root, config)
    }

    /// Scans the packages directory using an already-loaded config.
    pub fn with_config(root: impl Into<PathBuf>, config: BuildConfig) -> Result<Self> {
        let root = root.into();
        let registry = load_registry(config.packages_path(&root))?;
        Ok(Self {
            root,
            config,
            registry,
        })
    }

    /// Loads the extraction config of `package`.
    pub fn extraction_config(&self, package: &PackageDescriptor) -> Result<ExtractionConfig> {
        let path = package.directory.join(&self.config.extractor.config_file);
        load_extraction_config(path, &package.directory)
    }

    /// Output directory of `package`.
    pub fn output_dir(&self, package: &PackageDescriptor) -> PathBuf {
        self.config.output_path(&package.directory)
    }

    /// Intermediate paths removed after `package` merged successfully.
    pub fn cleanup_paths(&self, package: &PackageDescriptor) -> Vec<PathBuf> {
        self.config.cleanup_paths(&self.root, &package.directory)
    }
}
