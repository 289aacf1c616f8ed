//! Declaration closure merging and build dispatch.
//!
//! A public package's rolled-up declaration file often refers to private
//! packages of the same repository that are never published. This crate
//! pulls those packages' declarations in next to the public output and
//! rewrites the references into relative ones, recursively and safely over
//! cyclic package graphs.
//!
//! # Main entry points
//!
//! - [`dispatch::BuildDispatcher`]: bundle each requested target and, when
//!   asked, roll up its declarations.
//! - [`closure::ClosureMerger`]: merge one root package's declaration
//!   closure.
//! - [`scanner::scan`] and [`rewriter::rewrite_references`]: the text-level
//!   building blocks.
//!
//! External programs sit behind the [`bundler::Bundler`] and
//! [`extractor::ExtractionTool`] traits so the merge logic can be driven by
//! fakes.
//!
//! # Example
//!
//! ```no_run
//! use typeroll_config::Workspace;
//! use typeroll_merge::bundler::CommandBundler;
//! use typeroll_merge::dispatch::{BuildDispatcher, BuildOptions};
//! use typeroll_merge::extractor::CommandExtractor;
//!
//! let workspace = Workspace::load(".", None).unwrap();
//! let mut bundler = CommandBundler::new(&workspace.config.bundler, &workspace.root);
//! let mut extractor = CommandExtractor::new(&workspace.config.extractor, &workspace.root);
//! let options = BuildOptions { merge_types: true, ..BuildOptions::default() };
//!
//! let summary = BuildDispatcher::new(&workspace, &mut bundler, &mut extractor, options)
//!     .run(&["core"])
//!     .unwrap();
//! println!("built {:?}", summary.built);
//! ```

pub mod bundler;
pub mod closure;
pub mod dispatch;
mod error;
pub mod extractor;
pub mod report;
pub mod rewriter;
pub mod scanner;

pub use error::{BuildError, MergeError, Result};
pub use report::{MergeFailure, MergeReport};
