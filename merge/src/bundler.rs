//! The bundler boundary.
//!
//! Bundling is delegated to an external program (rollup by default) that
//! reads its per-target options from an `--environment` string.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};
use typeroll_config::BundlerConfig;

use crate::error::{MergeError, Result};

/// Per-target options handed to the bundler.
///
/// # Examples
///
/// ```
/// use typeroll_merge::bundler::BundleEnvironment;
///
/// let env = BundleEnvironment {
///     formats: Some("esm-bundler".to_string()),
///     source_map: true,
///     ..BundleEnvironment::new("core")
/// };
/// assert_eq!(
///     env.render(),
///     "ENV:production,TARGET:core,CHECK:true,FORMATS:esm-bundler,SOURCE_MAP:true",
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEnvironment {
    pub target: String,
    pub production: bool,
    pub type_check: bool,
    pub formats: Option<String>,
    pub source_map: bool,
    pub no_external: bool,
    pub watch: bool,
}

impl BundleEnvironment {
    /// Production, type-checked, all formats.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            production: true,
            type_check: true,
            formats: None,
            source_map: false,
            no_external: false,
            watch: false,
        }
    }

    /// Renders the `KEY:value` list passed through `--environment`.
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(6);
        if self.production {
            parts.push("ENV:production".to_string());
        }
        parts.push(format!("TARGET:{}", self.target));
        parts.push(format!("CHECK:{}", self.type_check));
        if let Some(formats) = self.formats.as_deref().filter(|f| !f.is_empty()) {
            parts.push(format!("FORMATS:{formats}"));
        }
        if self.source_map {
            parts.push("SOURCE_MAP:true".to_string());
        }
        if self.no_external {
            parts.push("NO_EXTERNAL:true".to_string());
        }
        parts.join(",")
    }
}

/// Something that can bundle one target.
pub trait Bundler {
    fn bundle(&mut self, env: &BundleEnvironment) -> Result<()>;
}

impl<T: Bundler + ?Sized> Bundler for &mut T {
    fn bundle(&mut self, env: &BundleEnvironment) -> Result<()> {
        (**self).bundle(env)
    }
}

/// Runs the configured bundler program from the repository root.
///
/// Output is inherited so the bundler's own progress reaches the terminal.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

impl CommandBundler {
    pub fn new(config: &BundlerConfig, cwd: &Path) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            cwd: cwd.to_path_buf(),
        }
    }

    fn command_args(&self, env: &BundleEnvironment) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(if env.watch { "-wc" } else { "-c" }.to_string());
        args.push("--environment".to_string());
        args.push(env.render());
        args
    }
}

impl Bundler for CommandBundler {
    fn bundle(&mut self, env: &BundleEnvironment) -> Result<()> {
        let args = self.command_args(env);
        info!(target_pkg = %env.target, watch = env.watch, "Bundling");
        debug!(program = %self.program, args = ?args, "Running bundler");

        let status = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| MergeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(MergeError::ProcessFailed {
                program: self.program.clone(),
                code: status.code(),
            })
        }
    }
}
