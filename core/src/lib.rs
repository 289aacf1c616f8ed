//! Core types for rolling up TypeScript declarations across a monorepo.
//!
//! This crate defines the data model shared by the rest of the workspace:
//!
//! - [`PackageDescriptor`]: one package (name, directory, private flag).
//! - [`PackageRegistry`]: the ordered catalog of every package, with
//!   fuzzy target matching.
//! - [`DependencyEdge`]: a reference from a declaration file to a private
//!   package.
//! - [`ExtractionConfig`]: one extraction job, and [`derive_config`] to
//!   repoint it at a sibling package without mutating the original.
//!
//! Validation ([`validate_registry`]) rejects registries whose names or
//! directories are ambiguous.
//!
//! # Example
//!
//! ```
//! use typeroll_core::*;
//!
//! let registry = PackageRegistry::new(vec![
//!     PackageDescriptor::new("garfish", "/repo/packages/garfish", false)
//!         .with_types("dist/garfish.d.ts"),
//!     PackageDescriptor::new("@garfish/utils", "/repo/packages/utils", true),
//! ]);
//!
//! assert!(validate_registry(&registry).is_empty());
//! assert_eq!(registry.public_targets(), vec!["garfish".to_string()]);
//! assert_eq!(registry.private_by_name("@garfish/utils").unwrap().dir_name, "utils");
//! ```

mod error;
mod extraction;
mod registry;
mod types;
mod validate;

pub use error::{CoreError, Result};
pub use extraction::{ExtractionConfig, derive_config};
pub use registry::PackageRegistry;
pub use types::*;
pub use validate::{ValidationError, validate_registry};
