//! Build dispatch: bundle each requested target, then roll up its types.

use std::path::Path;

use tracing::{debug, info, warn};
use typeroll_config::Workspace;
use typeroll_core::PackageDescriptor;

use crate::bundler::{BundleEnvironment, Bundler};
use crate::closure::ClosureMerger;
use crate::error::{BuildError, MergeError};
use crate::extractor::ExtractionTool;
use crate::report::MergeReport;

/// Options shared by every target of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub watch: bool,
    /// Output format override; when set, previous output is kept.
    pub formats: Option<String>,
    pub no_check: bool,
    pub source_map: bool,
    pub merge_types: bool,
    pub no_external: bool,
    /// Build every package matching a pattern instead of the first.
    pub all_matching: bool,
}

impl BuildOptions {
    fn environment(&self, target: &str) -> BundleEnvironment {
        BundleEnvironment {
            target: target.to_string(),
            production: true,
            type_check: !self.no_check,
            formats: self.formats.clone(),
            source_map: self.source_map,
            no_external: self.no_external,
            watch: self.watch,
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    /// Targets that were bundled, in build order.
    pub built: Vec<String>,
    /// Private targets that were skipped.
    pub skipped: Vec<String>,
    /// One report per merged target.
    pub merges: Vec<MergeReport>,
}

/// Runs builds for a workspace, one target at a time.
pub struct BuildDispatcher<'a> {
    workspace: &'a Workspace,
    bundler: &'a mut dyn Bundler,
    extractor: &'a mut dyn ExtractionTool,
    options: BuildOptions,
}

impl<'a> BuildDispatcher<'a> {
    pub fn new(
        workspace: &'a Workspace,
        bundler: &'a mut dyn Bundler,
        extractor: &'a mut dyn ExtractionTool,
        options: BuildOptions,
    ) -> Self {
        Self {
            workspace,
            bundler,
            extractor,
            options,
        }
    }

    /// Resolves command-line patterns to target ids.
    ///
    /// No patterns selects every public package.
    pub fn resolve_targets<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Vec<String>, BuildError> {
        if patterns.is_empty() {
            return Ok(self.workspace.registry.public_targets());
        }
        Ok(self
            .workspace
            .registry
            .fuzzy_match(patterns, self.options.all_matching)?)
    }

    /// Builds the targets selected by `patterns`, stopping at the first
    /// failure.
    pub fn run<S: AsRef<str>>(&mut self, patterns: &[S]) -> Result<BuildSummary, BuildError> {
        let targets = self.resolve_targets(patterns)?;
        info!(targets = ?targets, "Resolved build targets");

        let mut summary = BuildSummary::default();
        for target in &targets {
            self.build_target(target, &mut summary)?;
        }
        Ok(summary)
    }

    fn build_target(&mut self, target: &str, summary: &mut BuildSummary) -> Result<(), BuildError> {
        let workspace = self.workspace;
        let Some(package) = workspace.registry.by_dir_name(target) else {
            return Err(typeroll_core::CoreError::TargetNotFound(target.to_string()).into());
        };

        if package.is_private {
            debug!(target_pkg = target, "Skipping private package");
            summary.skipped.push(target.to_string());
            return Ok(());
        }

        if self.options.formats.is_none() {
            remove_dir_if_present(&workspace.output_dir(package)).map_err(MergeError::from)?;
        }

        let env = self.options.environment(target);
        self.bundler.bundle(&env).map_err(|source| BuildError::Bundler {
            target: target.to_string(),
            source,
        })?;
        summary.built.push(target.to_string());

        if self.options.merge_types && package.has_types() {
            let report = self.merge_package_types(package)?;
            summary.merges.push(report);
        }
        Ok(())
    }

    /// Rolls up the declarations of `package` and its private closure.
    ///
    /// On success the intermediate build trees are removed. On failure they
    /// are left in place for inspection and [`BuildError::MergeFailed`] is
    /// returned.
    pub fn merge_package_types(&mut self, package: &PackageDescriptor) -> Result<MergeReport, BuildError> {
        println!("Rolling up type definitions for {}...", package.dir_name);

        let root_config = self.workspace.extraction_config(package)?;
        let report = ClosureMerger::new(&self.workspace.registry, &mut *self.extractor)
            .merge_all(&package.dir_name, &root_config)?;

        if !report.succeeded() {
            warn!(
                target_pkg = %package.dir_name,
                failed = ?report.failed_packages(),
                partial = ?report.partial_output,
                "Type rollup failed; keeping intermediate files"
            );
            return Err(BuildError::MergeFailed {
                target: package.dir_name.clone(),
                errors: report.error_count(),
                warnings: report.warning_count(),
                failed_packages: report.failed_packages(),
            });
        }

        for path in self.workspace.cleanup_paths(package) {
            remove_dir_if_present(&path).map_err(MergeError::from)?;
        }
        println!("API Extractor completed successfully.");
        Ok(report)
    }
}

fn remove_dir_if_present(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        debug!(path = %path.display(), "Removing directory");
        std::fs::remove_dir_all(path)?;
    } else if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
