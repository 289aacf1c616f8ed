//! Reference scanning for declaration files.
//!
//! Finds the module specifiers a declaration file refers to and keeps the
//! ones that name a private package of the workspace. Public packages are
//! already self-contained, and unknown specifiers belong to third-party
//! dependencies; both are left alone.
//!
//! Recognized reference forms:
//!
//! - `import … from 'x'` / `export … from 'x'`
//! - `import 'x'`, `import('x')`
//! - `require('x')`
//! - `declare module 'x'`
//! - `/// <reference types="x" />`

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use typeroll_core::{DependencyEdge, PackageRegistry};

use crate::error::{MergeError, Result};

static SPECIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:\bfrom|\bimport|\brequire|\bdeclare\s+module)\s*\(?\s*['"]([^'"\r\n]+)['"]|///\s*<reference\s+types\s*=\s*['"]([^'"\r\n]+)['"]"#,
    )
    .expect("static regex must compile")
});

/// Collects every module specifier referenced by `contents`, deduplicated.
///
/// # Examples
///
/// ```
/// use typeroll_merge::scanner::collect_specifiers;
///
/// let dts = r#"
/// /// <reference types="node" />
/// import { Loader } from '@garfish/loader';
/// export * from "@garfish/utils";
/// export declare type Hooks = import('@garfish/hooks').Hooks;
/// "#;
/// let specs = collect_specifiers(dts);
/// assert!(specs.contains("node"));
/// assert!(specs.contains("@garfish/loader"));
/// assert!(specs.contains("@garfish/utils"));
/// assert!(specs.contains("@garfish/hooks"));
/// ```
pub fn collect_specifiers(contents: &str) -> BTreeSet<String> {
    SPECIFIER_RE
        .captures_iter(contents)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|spec| !spec.is_empty())
        .collect()
}

/// Returns edges to the private packages `contents` refers to.
///
/// Specifiers must equal a package name exactly. Edges follow registry
/// order, one per package, so traversal order does not depend on the order
/// of imports in the file.
///
/// # Examples
///
/// ```
/// use typeroll_core::{PackageDescriptor, PackageRegistry};
/// use typeroll_merge::scanner::scan;
///
/// let registry = PackageRegistry::new(vec![
///     PackageDescriptor::new("pub-x", "/r/pub-x", false),
///     PackageDescriptor::new("priv-y", "/r/priv-y", true),
/// ]);
/// let dts = "import { A } from 'pub-x';\nimport { B } from 'priv-y';\n";
/// let edges = scan(dts, &registry);
/// assert_eq!(edges.len(), 1);
/// assert_eq!(edges[0].pkg_name, "priv-y");
/// ```
pub fn scan(contents: &str, registry: &PackageRegistry) -> Vec<DependencyEdge> {
    let specifiers = collect_specifiers(contents);
    registry.private_edges(|name| specifiers.contains(name))
}

/// Reads the declaration file at `path` and scans it.
///
/// This is where the registry and the scanner meet: the result is the
/// subset of private packages the file refers to, each with its directory.
///
/// # Errors
///
/// Returns [`MergeError::MissingDeclaration`] if the file does not exist and
/// [`MergeError::Io`] if it cannot be read.
pub fn private_dependencies(path: &Path, registry: &PackageRegistry) -> Result<Vec<DependencyEdge>> {
    if !path.is_file() {
        return Err(MergeError::MissingDeclaration(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    let edges = scan(&contents, registry);
    debug!(
        file = %path.display(),
        deps = ?edges.iter().map(|e| e.pkg_name.as_str()).collect::<Vec<_>>(),
        "Scanned declaration file"
    );
    Ok(edges)
}
