//! Build configuration and on-disk workspace loading.
//!
//! This crate turns a repository on disk into the in-memory model from
//! `typeroll-core`: it reads the YAML build config, every package's
//! `package.json`, and the per-package extraction tool config.
//!
//! # Quick start
//!
//! ```no_run
//! use typeroll_config::Workspace;
//!
//! let workspace = Workspace::load("/path/to/repo", None).unwrap();
//! let app = workspace.registry.by_dir_name("app").unwrap();
//! let job = workspace.extraction_config(app).unwrap();
//! println!("{} -> {}", job.entry_point.display(), job.output.display());
//! ```

mod config;
mod error;
mod extraction;
mod loader;
mod manifest;

pub use config::{
    BuildConfig, BundlerConfig, CONFIG_PLACEHOLDER, DEFAULT_CONFIG_FILE, ENTRY_PLACEHOLDER,
    ExtractorConfig, OUTPUT_PLACEHOLDER, PACKAGE_PLACEHOLDER, ROOT_PLACEHOLDER,
};
pub use error::{ConfigError, Result};
pub use extraction::{
    load_extraction_config, normalize_path, render_extraction_settings, strip_json_comments,
};
pub use loader::{Workspace, load_registry};
pub use manifest::{MANIFEST_FILE, PackageManifest};
