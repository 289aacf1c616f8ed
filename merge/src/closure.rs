//! Declaration closure merging.
//!
//! Starting from a root package's rolled-up declaration file, the merger
//! finds every private package the file refers to, extracts that package's
//! declarations next to the root output, and rewrites the reference into a
//! relative one. The same happens recursively for each extracted file, so
//! the root output ends up with no package-name references to private
//! packages at all.
//!
//! The package graph may contain cycles and diamonds. Both are handled by a
//! [`VisitedSet`] keyed on output path: the second time a package is reached
//! within one closure, its declarations are already in place, so only the
//! reference in the calling file is rewritten.
//!
//! When one sibling fails, the remaining siblings are still attempted so
//! that every failure in the closure is reported in one run. A failed
//! output is remembered and never extracted twice. A closure that fails
//! never leaves its root output at the final path: whatever was written is
//! moved aside to `<output>.partial` for inspection.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use typeroll_core::{DependencyEdge, ExtractionConfig, PackageRegistry, derive_config};

use crate::error::Result;
use crate::extractor::ExtractionTool;
use crate::report::MergeReport;
use crate::rewriter::rewrite_file;
use crate::scanner::private_dependencies;

/// Output paths already extracted within one closure, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    order: Vec<PathBuf>,
    members: HashSet<PathBuf>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path`; returns `false` if it was already present.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        if self.members.contains(&path) {
            return false;
        }
        self.members.insert(path.clone());
        self.order.push(path);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.members.contains(path)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Paths in the order they were first inserted.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.order.iter().map(PathBuf::as_path)
    }
}

/// Book-keeping for one root package's closure.
#[derive(Debug, Default)]
struct ClosureState {
    visited: VisitedSet,
    failed: HashSet<PathBuf>,
    /// Output -> outputs it refers to, as discovered.
    links: HashMap<PathBuf, Vec<PathBuf>>,
    /// Output -> package name.
    packages: HashMap<PathBuf, String>,
}

impl ClosureState {
    fn link(&mut self, from: &Path, to: &Path) {
        let children = self.links.entry(from.to_path_buf()).or_default();
        if !children.iter().any(|child| child == to) {
            children.push(to.to_path_buf());
        }
    }

    /// `true` when a failed extraction is reachable from `output`.
    fn is_tainted(&self, output: &Path) -> bool {
        let mut seen: HashSet<&Path> = HashSet::new();
        let mut stack = vec![output];
        while let Some(node) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            if self.failed.contains(node) {
                return true;
            }
            if let Some(children) = self.links.get(node) {
                stack.extend(children.iter().map(PathBuf::as_path));
            }
        }
        false
    }
}

/// Merges the declaration closure of one root package at a time.
pub struct ClosureMerger<'a> {
    registry: &'a PackageRegistry,
    tool: &'a mut dyn ExtractionTool,
}

impl<'a> ClosureMerger<'a> {
    pub fn new(registry: &'a PackageRegistry, tool: &'a mut dyn ExtractionTool) -> Self {
        Self { registry, tool }
    }

    /// Extracts `root_config` and merges every private package it reaches.
    ///
    /// `root_target` is the root package's directory name, which must appear
    /// as a directory segment of `root_config.entry_point`; sibling jobs are
    /// derived by replacing it.
    ///
    /// Extraction failures are recorded in the returned report rather than
    /// returned as errors. `Err` means the closure could not be computed at
    /// all (unreadable files, underivable paths, a tool that cannot start).
    pub fn merge_all(&mut self, root_target: &str, root_config: &ExtractionConfig) -> Result<MergeReport> {
        let mut report = MergeReport::new(root_target);
        let mut state = ClosureState::default();
        remove_if_present(&partial_path(&root_config.output))?;

        let outcome = self.tool.extract(root_config)?;
        report.extractions += 1;
        if !outcome.succeeded {
            warn!(
                target_pkg = root_target,
                errors = outcome.error_count,
                warnings = outcome.warning_count,
                "Root declaration extraction failed"
            );
            report.record_failure(root_target, root_config.output.clone(), outcome);
            report.partial_output = move_aside(&root_config.output)?;
            return Ok(report);
        }

        state.visited.insert(root_config.output.clone());
        report.outputs.push(root_config.output.clone());

        let edges = private_dependencies(&root_config.output, self.registry)?;
        for edge in &edges {
            // Every sibling runs, even after a failure.
            self.merge_one(
                &mut state,
                &mut report,
                root_config,
                &root_config.output,
                root_target,
                edge,
            )?;
        }

        report.merged = state
            .visited
            .iter()
            .skip(1)
            .filter(|output| !state.is_tainted(output))
            .filter_map(|output| state.packages.get(output).cloned())
            .collect();

        if !report.succeeded() {
            report.partial_output = move_aside(&root_config.output)?;
        }

        info!(
            target_pkg = root_target,
            merged = report.merged.len(),
            failures = report.failures.len(),
            extractions = report.extractions,
            "Declaration closure complete"
        );
        Ok(report)
    }

    fn merge_one(
        &mut self,
        state: &mut ClosureState,
        report: &mut MergeReport,
        parent: &ExtractionConfig,
        calling_file: &Path,
        current_dir: &str,
        edge: &DependencyEdge,
    ) -> Result<bool> {
        let config = derive_config(parent, current_dir, &edge.dir_name)?;
        let local_name = config.local_name();
        state.link(calling_file, &config.output);

        if state.visited.contains(&config.output) {
            if state.is_tainted(&config.output) {
                debug!(package = %edge.pkg_name, "Already extracted but its closure failed");
                return Ok(false);
            }
            debug!(package = %edge.pkg_name, "Skipping already merged package");
            rewrite_file(calling_file, &edge.pkg_name, &local_name)?;
            return Ok(true);
        }

        if state.failed.contains(&config.output) {
            debug!(package = %edge.pkg_name, "Skipping package whose extraction already failed");
            return Ok(false);
        }

        debug!(
            package = %edge.pkg_name,
            entry = %config.entry_point.display(),
            output = %config.output.display(),
            "Extracting private package declarations"
        );
        let outcome = self.tool.extract(&config)?;
        report.extractions += 1;
        if !outcome.succeeded {
            warn!(
                package = %edge.pkg_name,
                errors = outcome.error_count,
                warnings = outcome.warning_count,
                "Declaration extraction failed"
            );
            state.failed.insert(config.output.clone());
            report.record_failure(&edge.pkg_name, config.output.clone(), outcome);
            return Ok(false);
        }

        state.visited.insert(config.output.clone());
        state.packages.insert(config.output.clone(), edge.pkg_name.clone());
        report.outputs.push(config.output.clone());

        let children = private_dependencies(&config.output, self.registry)?;
        let mut all_merged = true;
        for child in &children {
            let merged = self.merge_one(state, report, &config, &config.output, &edge.dir_name, child)?;
            all_merged &= merged;
        }

        if all_merged {
            rewrite_file(calling_file, &edge.pkg_name, &local_name)?;
        }
        Ok(all_merged)
    }
}

/// Where the root output of a failed closure is kept.
pub fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}

fn move_aside(output: &Path) -> Result<Option<PathBuf>> {
    if !output.is_file() {
        return Ok(None);
    }
    let partial = partial_path(output);
    std::fs::rename(output, &partial)?;
    warn!(
        output = %output.display(),
        partial = %partial.display(),
        "Moved half-merged declarations aside"
    );
    Ok(Some(partial))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;
    use typeroll_core::{ExtractionOutcome, PackageDescriptor};

    use super::*;

    /// Copies the entry point to the output, or fails for scripted outputs.
    #[derive(Default)]
    struct CopyTool {
        failing: HashSet<String>,
        calls: Vec<PathBuf>,
    }

    impl ExtractionTool for CopyTool {
        fn extract(&mut self, config: &ExtractionConfig) -> Result<ExtractionOutcome> {
            self.calls.push(config.output.clone());
            if self.failing.contains(&config.local_name()) {
                return Ok(ExtractionOutcome::failure(2, 1));
            }
            std::fs::create_dir_all(config.output.parent().unwrap())?;
            std::fs::copy(&config.entry_point, &config.output)?;
            Ok(ExtractionOutcome::success())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        registry: PackageRegistry,
    }

    impl Fixture {
        /// `packages` is `(dir_name, private, declaration text)`.
        fn new(packages: &[(&str, bool, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut descriptors = Vec::new();
            for (name, private, dts) in packages {
                let entry = dir.path().join("dist/packages").join(name).join("index.d.ts");
                std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
                std::fs::write(&entry, dts).unwrap();
                descriptors.push(PackageDescriptor::new(
                    format!("@x/{name}"),
                    dir.path().join("packages").join(name),
                    *private,
                ));
            }
            Self {
                dir,
                registry: PackageRegistry::new(descriptors),
            }
        }

        fn root_config(&self, name: &str) -> ExtractionConfig {
            ExtractionConfig::new(
                self.dir.path().join("dist/packages").join(name).join("index.d.ts"),
                self.dir.path().join("out").join(format!("{name}.d.ts")),
                json!({}),
            )
        }

        fn output_path(&self, name: &str) -> PathBuf {
            self.dir.path().join("out").join(format!("{name}.d.ts"))
        }

        fn output(&self, name: &str) -> String {
            std::fs::read_to_string(self.output_path(name)).unwrap()
        }
    }

    #[test]
    fn test_end_to_end_chain() {
        let fx = Fixture::new(&[
            ("a", false, "import { B } from '@x/b';\nexport declare const a: B;\n"),
            ("b", true, "import { C } from '@x/c';\nexport declare type B = C;\n"),
            ("c", true, "export declare type C = string;\n"),
        ]);
        let mut tool = CopyTool::default();
        let report = ClosureMerger::new(&fx.registry, &mut tool)
            .merge_all("a", &fx.root_config("a"))
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.extractions, 3);
        assert_eq!(report.merged, vec!["@x/b", "@x/c"]);
        assert_eq!(fx.output("a"), "import { B } from './b';\nexport declare const a: B;\n");
        assert_eq!(fx.output("b"), "import { C } from './c';\nexport declare type B = C;\n");
        assert!(!fx.output("a").contains("@x/"));
    }

    #[test]
    fn test_cycle_terminates_with_single_extractions() {
        let fx = Fixture::new(&[
            ("a", true, "import { B } from '@x/b';\nexport declare type A = B;\n"),
            ("b", true, "import { A } from '@x/a';\nexport declare type B = A | 1;\n"),
        ]);
        let mut tool = CopyTool::default();
        let report = ClosureMerger::new(&fx.registry, &mut tool)
            .merge_all("a", &fx.root_config("a"))
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(tool.calls.len(), 2);
        assert!(fx.output("a").contains("from './b'"));
        assert!(fx.output("b").contains("from './a'"));
    }

    #[test]
    fn test_diamond_extracts_shared_dependency_once() {
        let fx = Fixture::new(&[
            ("app", false, "import '@x/left';\nimport '@x/right';\n"),
            ("left", true, "import { S } from '@x/shared';\n"),
            ("right", true, "import { S } from '@x/shared';\n"),
            ("shared", true, "export declare type S = 1;\n"),
        ]);
        let mut tool = CopyTool::default();
        let report = ClosureMerger::new(&fx.registry, &mut tool)
            .merge_all("app", &fx.root_config("app"))
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.extractions, 4);
        let shared = fx.dir.path().join("out/shared.d.ts");
        assert_eq!(tool.calls.iter().filter(|p| **p == shared).count(), 1);
        assert_eq!(fx.output("left"), "import { S } from './shared';\n");
        assert_eq!(fx.output("right"), "import { S } from './shared';\n");
    }

    #[test]
    fn test_nested_failure_fails_closure_without_rewrites() {
        let fx = Fixture::new(&[
            ("a", false, "import { B } from '@x/b';\nimport { D } from '@x/d';\n"),
            ("b", true, "import { C } from '@x/c';\n"),
            ("c", true, "export declare type C = 1;\n"),
            ("d", true, "export declare type D = 1;\n"),
        ]);
        let mut tool = CopyTool {
            failing: HashSet::from(["c".to_string()]),
            ..CopyTool::default()
        };
        let report = ClosureMerger::new(&fx.registry, &mut tool)
            .merge_all("a", &fx.root_config("a"))
            .unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.failed_packages(), vec!["@x/c"]);
        assert_eq!((report.error_count(), report.warning_count()), (2, 1));
        // The sibling after the failing branch still ran.
        assert_eq!(report.merged, vec!["@x/d"]);

        // The half-merged root is moved aside, not left at the final path.
        let partial = partial_path(&fx.output_path("a"));
        assert!(!fx.output_path("a").exists());
        assert_eq!(report.partial_output.as_deref(), Some(partial.as_path()));
        let a = std::fs::read_to_string(&partial).unwrap();
        assert!(a.contains("'@x/b'"));
        assert!(a.contains("'./d'"));
        assert!(fx.output("b").contains("'@x/c'"));
    }

    #[test]
    fn test_successful_rerun_clears_stale_partial_output() {
        let fx = Fixture::new(&[
            ("a", false, "import { B } from '@x/b';\n"),
            ("b", true, "export declare type B = 1;\n"),
        ]);
        let partial = partial_path(&fx.output_path("a"));
        std::fs::create_dir_all(partial.parent().unwrap()).unwrap();
        std::fs::write(&partial, "import { B } from '@x/b';\n").unwrap();

        let mut tool = CopyTool::default();
        let report = ClosureMerger::new(&fx.registry, &mut tool)
            .merge_all("a", &fx.root_config("a"))
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.partial_output, None);
        assert!(!partial.exists());
        assert_eq!(fx.output("a"), "import { B } from './b';\n");
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/r/dist/garfish.d.ts")),
            PathBuf::from("/r/dist/garfish.d.ts.partial")
        );
    }

    #[test]
    fn test_failed_package_is_not_extracted_twice() {
        let fx = Fixture::new(&[
            ("app", false, "import '@x/left';\nimport '@x/right';\n"),
            ("left", true, "import '@x/bad';\n"),
            ("right", true, "import '@x/bad';\n"),
            ("bad", true, ""),
        ]);
        let mut tool = CopyTool {
            failing: HashSet::from(["bad".to_string()]),
            ..CopyTool::default()
        };
        let report = ClosureMerger::new(&fx.registry, &mut tool)
            .merge_all("app", &fx.root_config("app"))
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.extractions, 4);
        assert!(report.merged.is_empty());
    }

    #[test]
    fn test_root_failure_stops_before_scanning() {
        let fx = Fixture::new(&[("a", false, "import '@x/b';\n"), ("b", true, "")]);
        let mut tool = CopyTool {
            failing: HashSet::from(["a".to_string()]),
            ..CopyTool::default()
        };
        let report = ClosureMerger::new(&fx.registry, &mut tool)
            .merge_all("a", &fx.root_config("a"))
            .unwrap();

        assert_eq!(report.failed_packages(), vec!["a"]);
        assert_eq!(tool.calls.len(), 1);
        assert_eq!(report.partial_output, None);
    }

    #[test]
    fn test_visited_set_keeps_insertion_order() {
        let mut visited = VisitedSet::new();
        assert!(visited.insert(PathBuf::from("b")));
        assert!(visited.insert(PathBuf::from("a")));
        assert!(!visited.insert(PathBuf::from("b")));
        let order: Vec<&Path> = visited.iter().collect();
        assert_eq!(order, vec![Path::new("b"), Path::new("a")]);
        assert_eq!(visited.len(), 2);
    }
}
