//! The declaration extraction tool boundary.
//!
//! The closure merger only needs one capability from the outside world: run
//! the extraction tool for an [`ExtractionConfig`] and say whether it worked.
//! [`ExtractionTool`] is that seam; [`CommandExtractor`] implements it by
//! running an external program (API Extractor by default).
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use serde_json::json;
//! use typeroll_config::ExtractorConfig;
//! use typeroll_core::ExtractionConfig;
//! use typeroll_merge::extractor::{CommandExtractor, ExtractionTool};
//!
//! let job = ExtractionConfig::new(
//!     "/repo/packages/app/dist/packages/app/src/index.d.ts",
//!     "/repo/packages/app/dist/app.d.ts",
//!     json!({ "compiler": { "tsconfigFilePath": "<projectFolder>/tsconfig.json" } }),
//! )
//! .with_config_dir("/repo/packages/app");
//!
//! let mut tool = CommandExtractor::new(&ExtractorConfig::default(), Path::new("/repo"));
//! let outcome = tool.extract(&job).unwrap();
//! println!("{} errors, {} warnings", outcome.error_count, outcome.warning_count);
//! ```

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::LazyLock;
use std::thread::JoinHandle;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};
use typeroll_config::{
    CONFIG_PLACEHOLDER, ENTRY_PLACEHOLDER, ExtractorConfig, OUTPUT_PLACEHOLDER,
    render_extraction_settings,
};
use typeroll_core::{ExtractionConfig, ExtractionOutcome};
use wait_timeout::ChildExt;

use crate::error::{MergeError, Result};

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"completed with (\d+) errors? and (\d+) warnings?").expect("static regex must compile")
});

/// Something that can flatten a package's declarations into one file.
pub trait ExtractionTool {
    /// Runs one extraction job.
    ///
    /// A job that runs and fails is reported through the outcome; `Err` is
    /// reserved for not being able to run the job at all.
    fn extract(&mut self, config: &ExtractionConfig) -> Result<ExtractionOutcome>;
}

impl<T: ExtractionTool + ?Sized> ExtractionTool for &mut T {
    fn extract(&mut self, config: &ExtractionConfig) -> Result<ExtractionOutcome> {
        (**self).extract(config)
    }
}

/// Runs an external extraction program per job.
///
/// Each job's settings are written to a temporary JSON file that lives for
/// the duration of the run. The file is created in the job's
/// [`config_dir`](ExtractionConfig::config_dir) so relative settings such as
/// `extends` keep resolving as they did in the original config. Argument
/// templates may reference the file, the entry point and the output through
/// `{config}`, `{entry}` and `{output}`.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    cwd: PathBuf,
}

impl CommandExtractor {
    /// Creates an extractor from configuration, running from `cwd`.
    pub fn new(config: &ExtractorConfig, cwd: &Path) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
            cwd: cwd.to_path_buf(),
        }
    }

    fn render_args(&self, config_file: &Path, job: &ExtractionConfig) -> Vec<String> {
        let config_file = config_file.to_string_lossy();
        let entry = job.entry_point.to_string_lossy();
        let output = job.output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(CONFIG_PLACEHOLDER, &config_file)
                    .replace(ENTRY_PLACEHOLDER, &entry)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }

    fn wait(&self, child: &mut Child) -> Result<Option<ExitStatus>> {
        match self.timeout {
            Some(timeout) => Ok(child.wait_timeout(timeout)?),
            None => Ok(Some(child.wait()?)),
        }
    }
}

impl ExtractionTool for CommandExtractor {
    fn extract(&mut self, job: &ExtractionConfig) -> Result<ExtractionOutcome> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".typeroll-extract-").suffix(".json");
        let mut settings_file = match &job.config_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        serde_json::to_writer_pretty(settings_file.as_file_mut(), &render_extraction_settings(job))?;
        settings_file.as_file_mut().flush()?;

        if let Some(parent) = job.output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let args = self.render_args(settings_file.path(), job);
        debug!(program = %self.program, args = ?args, "Running extraction tool");

        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| MergeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain both pipes off-thread so a chatty tool cannot fill a pipe
        // buffer and block before exiting.
        let stdout_thread = child.stdout.take().map(drain);
        let stderr_thread = child.stderr.take().map(drain);

        let status = match self.wait(&mut child)? {
            Some(status) => status,
            None => {
                warn!(
                    program = %self.program,
                    entry = %job.entry_point.display(),
                    "Extraction tool timed out"
                );
                let _ = child.kill();
                let _ = child.wait();
                return Ok(ExtractionOutcome::failure(1, 0));
            }
        };

        let mut output = collect(stdout_thread);
        output.push_str(&collect(stderr_thread));
        for line in output.lines().filter(|line| !line.trim().is_empty()) {
            debug!(target: "typeroll::extractor", "{line}");
        }

        let (errors, warnings) = count_diagnostics(&output);
        if status.success() {
            Ok(ExtractionOutcome {
                succeeded: true,
                error_count: errors,
                warning_count: warnings,
            })
        } else {
            // A non-zero exit is at least one error even if nothing was printed.
            Ok(ExtractionOutcome::failure(errors.max(1), warnings))
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            debug!(error = %e, "Failed to read extraction tool output");
        }
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|thread| thread.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

/// Counts errors and warnings in extraction tool output.
///
/// A summary line (`... completed with N errors and M warnings`) wins when
/// present; otherwise lines starting with `Error:` and `Warning:` are
/// counted.
///
/// # Examples
///
/// ```
/// use typeroll_merge::extractor::count_diagnostics;
///
/// let out = "Warning: src/index.ts:3:1 - (ae-missing-release-tag)\nError: boom\n";
/// assert_eq!(count_diagnostics(out), (1, 1));
/// assert_eq!(count_diagnostics("API Extractor completed with 2 errors and 5 warnings"), (2, 5));
/// ```
pub fn count_diagnostics(output: &str) -> (usize, usize) {
    if let Some(caps) = SUMMARY_RE.captures_iter(output).last() {
        let errors = caps[1].parse().unwrap_or(0);
        let warnings = caps[2].parse().unwrap_or(0);
        return (errors, warnings);
    }

    output.lines().map(str::trim_start).fold((0, 0), |(errors, warnings), line| {
        if line.starts_with("Error:") {
            (errors + 1, warnings)
        } else if line.starts_with("Warning:") {
            (errors, warnings + 1)
        } else {
            (errors, warnings)
        }
    })
}
