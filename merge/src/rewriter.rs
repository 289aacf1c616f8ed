//! Rewriting private-package references into local relative references.
//!
//! Once a private package's declarations sit next to the file that imports
//! them, `from '@scope/pkg'` must become `from './pkg'`. Only whole quoted
//! specifiers are rewritten: the quotes have to surround the package name
//! directly, so longer names sharing a prefix and subpath imports are never
//! touched.

use std::path::Path;

use regex::{Captures, Regex};
use tracing::debug;

use crate::error::Result;

fn specifier_pattern(pkg_name: &str) -> Regex {
    let escaped = regex::escape(pkg_name);
    Regex::new(&format!(r#"'{escaped}'|"{escaped}""#)).expect("escaped specifier regex must compile")
}

/// Rewrites `pkg_name` specifiers in `contents` to `./<local_name>`.
///
/// Returns the new text and the number of replacements. The quote style of
/// each occurrence is preserved.
///
/// # Examples
///
/// ```
/// use typeroll_merge::rewriter::rewrite_references;
///
/// let dts = "import { a } from '@x/utils';\nimport { b } from \"@x/utils-extra\";\n";
/// let (out, count) = rewrite_references(dts, "@x/utils", "utils");
/// assert_eq!(count, 1);
/// assert_eq!(out, "import { a } from './utils';\nimport { b } from \"@x/utils-extra\";\n");
///
/// // Running again changes nothing.
/// let (again, count) = rewrite_references(&out, "@x/utils", "utils");
/// assert_eq!(count, 0);
/// assert_eq!(again, out);
/// ```
pub fn rewrite_references(contents: &str, pkg_name: &str, local_name: &str) -> (String, usize) {
    let pattern = specifier_pattern(pkg_name);
    let mut count = 0usize;
    let rewritten = pattern.replace_all(contents, |caps: &Captures<'_>| {
        count += 1;
        let quote = &caps[0][..1];
        format!("{quote}./{local_name}{quote}")
    });
    (rewritten.into_owned(), count)
}

/// Rewrites `pkg_name` references in the file at `path`, in place.
///
/// The file is only written when at least one reference changed. Returns
/// the number of replacements.
pub fn rewrite_file(path: &Path, pkg_name: &str, local_name: &str) -> Result<usize> {
    let contents = std::fs::read_to_string(path)?;
    let (rewritten, count) = rewrite_references(&contents, pkg_name, local_name);
    if count > 0 {
        std::fs::write(path, rewritten)?;
    }
    debug!(
        file = %path.display(),
        package = pkg_name,
        local = local_name,
        count,
        "Rewrote package references"
    );
    Ok(count)
}
