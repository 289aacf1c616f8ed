//! Structured reporting for declaration closure merges.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typeroll_core::ExtractionOutcome;

/// One extraction job that failed inside a closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeFailure {
    /// Package whose declarations could not be extracted.
    pub package: String,
    /// Output the job was supposed to write.
    pub output: PathBuf,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Result of merging one root package's declaration closure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeReport {
    /// Target id of the root package.
    pub target: String,
    /// Private packages merged with their entire subtree, in merge order.
    pub merged: Vec<String>,
    /// Every extraction failure in the closure.
    pub failures: Vec<MergeFailure>,
    /// Outputs written by successful extractions, in visit order.
    pub outputs: Vec<PathBuf>,
    /// Number of extraction tool invocations.
    pub extractions: usize,
    /// Where a failed closure's root output was moved, if it was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_output: Option<PathBuf>,
}

impl MergeReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// `true` when every extraction in the closure succeeded.
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total errors reported by failed extractions.
    pub fn error_count(&self) -> usize {
        self.failures.iter().map(|f| f.error_count).sum()
    }

    /// Total warnings reported by failed extractions.
    pub fn warning_count(&self) -> usize {
        self.failures.iter().map(|f| f.warning_count).sum()
    }

    /// Names of the packages whose extraction failed.
    pub fn failed_packages(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.package.clone()).collect()
    }

    pub(crate) fn record_failure(&mut self, package: &str, output: PathBuf, outcome: ExtractionOutcome) {
        self.failures.push(MergeFailure {
            package: package.to_string(),
            output,
            error_count: outcome.error_count,
            warning_count: outcome.warning_count,
        });
    }
}
