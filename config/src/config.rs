//! Build configuration for rollup runs.
//!
//! Defines the YAML-serializable configuration that tells the build where
//! packages live, which external programs bundle and extract, and what to
//! clean up after a successful declaration merge. Every field has a default,
//! so a missing file or an empty document yields a working configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! packages_dir: packages/core
//! output_dir: dist
//! bundler:
//!   program: rollup
//!   args: []
//! extractor:
//!   program: api-extractor
//!   args: [run, --local, --verbose, --config, "{config}"]
//!   config_file: api-extractor.json
//!   timeout_secs: 120
//! cleanup:
//!   - "{package}/dist/packages"
//!   - "{root}/dist"
//!   - "{root}/temp"
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Default configuration file name, looked up in the workspace root.
pub const DEFAULT_CONFIG_FILE: &str = "typeroll.yml";

/// Placeholder for the derived extraction config file in extractor args.
pub const CONFIG_PLACEHOLDER: &str = "{config}";
/// Placeholder for the declaration entry point in extractor args.
pub const ENTRY_PLACEHOLDER: &str = "{entry}";
/// Placeholder for the rolled-up output file in extractor args.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";
/// Placeholder for the package directory in cleanup entries.
pub const PACKAGE_PLACEHOLDER: &str = "{package}";
/// Placeholder for the workspace root in cleanup entries.
pub const ROOT_PLACEHOLDER: &str = "{root}";

/// How the external bundler is invoked.
///
/// The bundler receives `-c` (or `-wc` in watch mode) and
/// `--environment <flags>` after any extra `args`.
///
/// # Examples
///
/// ```
/// # use typeroll_config::BundlerConfig;
/// let bundler = BundlerConfig::default();
/// assert_eq!(bundler.program, "rollup");
/// assert!(bundler.args.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Program name or path.
    pub program: String,
    /// Extra arguments passed before the generated ones.
    pub args: Vec<String>,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            program: "rollup".to_string(),
            args: Vec::new(),
        }
    }
}

/// How the external declaration extraction tool is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Program name or path.
    pub program: String,
    /// Argument templates; `{config}`, `{entry}` and `{output}` are
    /// substituted per job.
    pub args: Vec<String>,
    /// Per-package extraction config file name.
    pub config_file: String,
    /// Kill the tool and count the job as failed after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: "api-extractor".to_string(),
            args: ["run", "--local", "--verbose", "--config", CONFIG_PLACEHOLDER]
                .iter()
                .map(|arg| arg.to_string())
                .collect(),
            config_file: "api-extractor.json".to_string(),
            timeout_secs: None,
        }
    }
}

/// Top-level build configuration.
///
/// Loaded from a YAML file (typically `typeroll.yml` in the workspace root).
///
/// # Examples
///
/// ```
/// use typeroll_config::BuildConfig;
///
/// let config: BuildConfig = serde_yaml::from_str("packages_dir: packages/core").unwrap();
/// assert_eq!(config.packages_dir, "packages/core");
/// assert_eq!(config.output_dir, "dist");
/// assert_eq!(config.extractor.program, "api-extractor");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding one subdirectory per package, relative to the root.
    pub packages_dir: String,
    /// Per-package output directory removed before a full rebuild.
    pub output_dir: String,
    /// Bundler invocation.
    pub bundler: BundlerConfig,
    /// Extraction tool invocation.
    pub extractor: ExtractorConfig,
    /// Paths removed after a successful merge; `{package}` and `{root}`
    /// expand to the package directory and workspace root.
    pub cleanup: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            packages_dir: "packages".to_string(),
            output_dir: "dist".to_string(),
            bundler: BundlerConfig::default(),
            extractor: ExtractorConfig::default(),
            cleanup: vec![
                format!("{PACKAGE_PLACEHOLDER}/dist/packages"),
                format!("{ROOT_PLACEHOLDER}/dist"),
                format!("{ROOT_PLACEHOLDER}/temp"),
            ],
        }
    }
}

impl BuildConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::ConfigError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "No build config found, using defaults");
            Ok(Self::default())
        }
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::ConfigError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Absolute packages directory for `root`.
    pub fn packages_path(&self, root: &Path) -> PathBuf {
        root.join(&self.packages_dir)
    }

    /// Output directory of one package.
    pub fn output_path(&self, package_dir: &Path) -> PathBuf {
        package_dir.join(&self.output_dir)
    }

    /// Expands the cleanup list for one package.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use typeroll_config::BuildConfig;
    ///
    /// let config = BuildConfig::default();
    /// let paths = config.cleanup_paths(Path::new("/repo"), Path::new("/repo/packages/app"));
    /// assert_eq!(paths, vec![
    ///     PathBuf::from("/repo/packages/app/dist/packages"),
    ///     PathBuf::from("/repo/dist"),
    ///     PathBuf::from("/repo/temp"),
    /// ]);
    /// ```
    pub fn cleanup_paths(&self, root: &Path, package_dir: &Path) -> Vec<PathBuf> {
        self.cleanup
            .iter()
            .map(|entry| {
                if let Some(rest) = entry.strip_prefix(PACKAGE_PLACEHOLDER) {
                    package_dir.join(rest.trim_start_matches('/'))
                } else if let Some(rest) = entry.strip_prefix(ROOT_PLACEHOLDER) {
                    root.join(rest.trim_start_matches('/'))
                } else {
                    root.join(entry)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
packages_dir: packages/core
output_dir: build
bundler:
  program: ./node_modules/.bin/rollup
  args: [--silent]
extractor:
  program: cp
  args: ["{entry}", "{output}"]
  config_file: extractor.json
  timeout_secs: 30
cleanup:
  - "{root}/temp"
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: BuildConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.packages_dir, "packages/core");
        assert_eq!(config.output_dir, "build");
        assert_eq!(config.bundler.program, "./node_modules/.bin/rollup");
        assert_eq!(config.bundler.args, vec!["--silent"]);
        assert_eq!(config.extractor.program, "cp");
        assert_eq!(config.extractor.args, vec!["{entry}", "{output}"]);
        assert_eq!(config.extractor.config_file, "extractor.json");
        assert_eq!(config.extractor.timeout_secs, Some(30));
        assert_eq!(config.cleanup, vec!["{root}/temp"]);
    }

    #[test]
    fn test_deserialize_partial_sections_keep_defaults() {
        let config: BuildConfig = serde_yaml::from_str("extractor:\n  timeout_secs: 5\n").unwrap();
        assert_eq!(config.packages_dir, "packages");
        assert_eq!(config.extractor.program, "api-extractor");
        assert_eq!(config.extractor.config_file, "api-extractor.json");
        assert_eq!(config.extractor.timeout_secs, Some(5));
        assert_eq!(config.cleanup.len(), 3);
    }

    #[test]
    fn test_cleanup_paths_without_placeholder_are_root_relative() {
        let config = BuildConfig {
            cleanup: vec!["temp".to_string()],
            ..BuildConfig::default()
        };
        let paths = config.cleanup_paths(Path::new("/repo"), Path::new("/repo/packages/a"));
        assert_eq!(paths, vec![PathBuf::from("/repo/temp")]);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::load_or_default(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config.bundler.program, "rollup");
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let original: BuildConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = BuildConfig::load(&path).unwrap();
        assert_eq!(loaded.packages_dir, original.packages_dir);
        assert_eq!(loaded.extractor.args, original.extractor.args);
        assert_eq!(loaded.cleanup, original.cleanup);
    }
}
