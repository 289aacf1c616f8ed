//! Extraction job configuration and derivation.
//!
//! An [`ExtractionConfig`] describes one run of the declaration extraction
//! tool: which declaration entry to read and where to write the flattened
//! result. Everything else the tool needs is opaque to this crate and kept in
//! `settings`, shared by reference between a root job and all jobs derived
//! from it.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use typeroll_core::{ExtractionConfig, derive_config};
//!
//! let root = ExtractionConfig::new(
//!     "/repo/packages/app/dist/packages/app/src/index.d.ts",
//!     "/repo/packages/app/dist/app.d.ts",
//!     json!({ "compiler": { "tsconfigFilePath": "tsconfig.json" } }),
//! );
//!
//! let dep = derive_config(&root, "app", "utils").unwrap();
//! assert_eq!(
//!     dep.entry_point.to_str(),
//!     Some("/repo/packages/app/dist/packages/utils/src/index.d.ts"),
//! );
//! assert_eq!(dep.output.to_str(), Some("/repo/packages/app/dist/utils.d.ts"));
//! assert!(dep.shares_settings_with(&root));
//! ```

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::types::{local_module_name, split_declaration_name};

/// One extraction job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Declaration entry point the tool starts from.
    pub entry_point: PathBuf,
    /// Rolled-up declaration file the tool writes.
    pub output: PathBuf,
    /// Remaining tool settings, read-only and shared across derived jobs.
    pub settings: Arc<serde_json::Value>,
    /// Directory the settings were loaded from. Relative paths inside
    /// `settings` resolve against it, so the tool must see its config there.
    pub config_dir: Option<PathBuf>,
    /// Index of the entry point component naming the current package.
    anchor: Option<usize>,
}

impl ExtractionConfig {
    /// Creates a root job that owns a fresh copy of `settings`.
    pub fn new(
        entry_point: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        settings: serde_json::Value,
    ) -> Self {
        Self {
            entry_point: entry_point.into(),
            output: output.into(),
            settings: Arc::new(settings),
            config_dir: None,
            anchor: None,
        }
    }

    /// Records the directory the settings were loaded from.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Module name other declaration files use to refer to this output.
    pub fn local_name(&self) -> String {
        local_module_name(&self.output)
    }

    /// Returns `true` when both jobs point at the same settings value.
    pub fn shares_settings_with(&self, other: &ExtractionConfig) -> bool {
        Arc::ptr_eq(&self.settings, &other.settings)
    }

    /// Method form of [`derive_config`].
    pub fn derive(&self, from_dir: &str, to_dir: &str) -> Result<Self> {
        derive_config(self, from_dir, to_dir)
    }
}

/// Derives the job for a sibling package from `base`.
///
/// The entry point directory segment naming `from_dir` becomes `to_dir`, and
/// the output file is renamed to `<to_dir><suffix>` inside the same output
/// directory. `base` is left untouched and the settings are shared.
///
/// For a root job the segment is the first directory named `from_dir` below
/// the deepest directory shared by the entry point and the output (the
/// package's build tree), falling back to the last such directory anywhere.
/// Derived jobs remember which segment was replaced, so later derivations
/// never touch a same-named directory further down the entry path.
///
/// # Errors
///
/// Returns [`CoreError::MissingSegment`] when the entry point has no
/// directory named `from_dir`, and [`CoreError::MissingFileName`] when the
/// output path has no file name.
pub fn derive_config(base: &ExtractionConfig, from_dir: &str, to_dir: &str) -> Result<ExtractionConfig> {
    let mut components: Vec<Component<'_>> = base.entry_point.components().collect();
    let position = match base.anchor {
        Some(index) if components.get(index).is_some_and(|c| c.as_os_str() == OsStr::new(from_dir)) => index,
        _ => locate_package_segment(base, &components, from_dir)?,
    };
    components[position] = Component::Normal(OsStr::new(to_dir));
    let entry_point: PathBuf = components.iter().collect();

    let output_name = base
        .output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CoreError::MissingFileName(base.output.clone()))?;
    let (_, suffix) = split_declaration_name(&output_name);
    let output = base.output.with_file_name(format!("{to_dir}{suffix}"));

    Ok(ExtractionConfig {
        entry_point,
        output,
        settings: Arc::clone(&base.settings),
        config_dir: base.config_dir.clone(),
        anchor: Some(position),
    })
}

fn locate_package_segment(base: &ExtractionConfig, components: &[Component<'_>], from_dir: &str) -> Result<usize> {
    // The file name itself is never a candidate.
    let dir_count = components.len().saturating_sub(1);
    let is_from = |component: &Component<'_>| component.as_os_str() == OsStr::new(from_dir);

    let output_dir = base.output.parent().unwrap_or_else(|| Path::new(""));
    let shared = components[..dir_count]
        .iter()
        .zip(output_dir.components())
        .take_while(|(entry, output)| *entry == output)
        .count();

    components[shared..dir_count]
        .iter()
        .position(is_from)
        .map(|offset| shared + offset)
        .or_else(|| components[..dir_count].iter().rposition(is_from))
        .ok_or_else(|| CoreError::MissingSegment {
            path: base.entry_point.clone(),
            segment: from_dir.to_string(),
        })
}
