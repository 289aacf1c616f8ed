use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::{DependencyEdge, PackageDescriptor};

/// Catalog of every package in the workspace, public and private.
///
/// Packages are kept sorted by directory name so that every traversal over
/// the registry is deterministic regardless of how the packages were found
/// on disk.
///
/// # Examples
///
/// ```
/// use typeroll_core::*;
///
/// let registry = PackageRegistry::new(vec![
///     PackageDescriptor::new("@acme/utils", "/repo/packages/utils", true),
///     PackageDescriptor::new("acme", "/repo/packages/acme", false),
/// ]);
///
/// assert_eq!(registry.len(), 2);
/// assert_eq!(registry.public_targets(), vec!["acme".to_string()]);
/// assert!(registry.private_by_name("@acme/utils").is_some());
/// assert!(registry.private_by_name("acme").is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageRegistry {
    packages: Vec<PackageDescriptor>,
}

impl PackageRegistry {
    /// Creates a registry, ordering packages by directory name.
    pub fn new(mut packages: Vec<PackageDescriptor>) -> Self {
        packages.sort_by(|a, b| a.dir_name.cmp(&b.dir_name));
        Self { packages }
    }

    /// Returns the number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns `true` if the registry holds no packages.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterates packages in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageDescriptor> {
        self.packages.iter()
    }

    /// Looks up a package by manifest name.
    pub fn get(&self, name: &str) -> Option<&PackageDescriptor> {
        self.packages.iter().find(|pkg| pkg.name == name)
    }

    /// Looks up a package by target id (directory name).
    pub fn by_dir_name(&self, dir_name: &str) -> Option<&PackageDescriptor> {
        self.packages.iter().find(|pkg| pkg.dir_name == dir_name)
    }

    /// Looks up a package by name, only if it is private.
    pub fn private_by_name(&self, name: &str) -> Option<&PackageDescriptor> {
        self.get(name).filter(|pkg| pkg.is_private)
    }

    /// Private packages in registry order.
    pub fn private_packages(&self) -> impl Iterator<Item = &PackageDescriptor> {
        self.packages.iter().filter(|pkg| pkg.is_private)
    }

    /// Target ids of all public packages, in registry order.
    pub fn public_targets(&self) -> Vec<String> {
        self.packages
            .iter()
            .filter(|pkg| !pkg.is_private)
            .map(|pkg| pkg.dir_name.clone())
            .collect()
    }

    /// Builds edges for every private package whose name satisfies `referenced`.
    ///
    /// Edges come out in registry order, one per package.
    pub fn private_edges<F>(&self, mut referenced: F) -> Vec<DependencyEdge>
    where
        F: FnMut(&str) -> bool,
    {
        self.private_packages()
            .filter(|pkg| referenced(&pkg.name))
            .map(PackageDescriptor::edge)
            .collect()
    }

    /// Resolves partial target names against directory names.
    ///
    /// Each pattern selects the first package whose directory name contains
    /// it, or every such package when `all_matching` is set. Duplicates are
    /// dropped while keeping first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TargetNotFound`] for the first pattern that
    /// matches nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use typeroll_core::*;
    ///
    /// let registry = PackageRegistry::new(vec![
    ///     PackageDescriptor::new("@acme/router", "/r/router", false),
    ///     PackageDescriptor::new("@acme/router-guard", "/r/router-guard", false),
    /// ]);
    /// assert_eq!(registry.fuzzy_match(&["rout"], false).unwrap(), vec!["router"]);
    /// assert_eq!(
    ///     registry.fuzzy_match(&["rout"], true).unwrap(),
    ///     vec!["router", "router-guard"],
    /// );
    /// assert!(registry.fuzzy_match(&["nope"], false).is_err());
    /// ```
    pub fn fuzzy_match<S: AsRef<str>>(&self, patterns: &[S], all_matching: bool) -> Result<Vec<String>> {
        let mut matched: Vec<String> = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let mut found = false;
            for pkg in &self.packages {
                if !pkg.dir_name.contains(pattern) {
                    continue;
                }
                found = true;
                if !matched.contains(&pkg.dir_name) {
                    matched.push(pkg.dir_name.clone());
                }
                if !all_matching {
                    break;
                }
            }
            if !found {
                return Err(CoreError::TargetNotFound(pattern.to_string()));
            }
        }

        Ok(matched)
    }
}
