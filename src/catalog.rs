//! Resolved kernel package catalog.
//!
//! A catalog is built once per run by a distribution resolver and is
//! read-only afterwards. Workers clone individual pairs out of it, so the
//! mutable fields (`valid`, `banner`, `isf_written`) are only ever set on a
//! worker's own copy and surfaced through the run report.

use std::collections::BTreeMap;

/// One kernel version's pair of resolvable package artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePair {
    /// Distro-native kernel identifier (the `uname -r` style token).
    pub kernel: String,
    /// URL of the runtime kernel package (carries `System.map`).
    pub kernel_url: String,
    /// URL of the debug-symbol package (carries the debug `vmlinux`).
    pub debug_url: String,
    /// Set by link validation on a worker's copy.
    pub valid: bool,
    /// Kernel banner recovered from the generator output, if any.
    pub banner: Option<String>,
    /// Set once the compressed ISF has been published.
    pub isf_written: bool,
}

impl PackagePair {
    pub fn new(kernel: impl Into<String>, kernel_url: String, debug_url: String) -> Self {
        Self {
            kernel: kernel.into(),
            kernel_url,
            debug_url,
            valid: false,
            banner: None,
            isf_written: false,
        }
    }
}

/// Kernel selection applied at the end of catalog resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelFilter {
    /// Keep every paired kernel.
    All,
    /// Keep only the exactly matching identifier.
    Exact(String),
}

impl KernelFilter {
    pub fn parse(raw: &str) -> Self {
        if raw == "all" {
            Self::All
        } else {
            Self::Exact(raw.to_owned())
        }
    }

    pub fn matches(&self, kernel: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exact(wanted) => wanted == kernel,
        }
    }
}

/// Mapping from kernel identifier to its package pair.
///
/// Keys are unique; a later discovery for the same identifier overwrites an
/// earlier one. The `BTreeMap` keeps iteration order deterministic.
#[derive(Debug, Default)]
pub struct Catalog {
    pairs: BTreeMap<String, PackagePair>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, replacing any earlier discovery for the same kernel.
    pub fn insert(&mut self, pair: PackagePair) -> Option<PackagePair> {
        self.pairs.insert(pair.kernel.clone(), pair)
    }

    pub fn get(&self, kernel: &str) -> Option<&PackagePair> {
        self.pairs.get(kernel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PackagePair)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<PackagePair> for Catalog {
    fn from_iter<I: IntoIterator<Item = PackagePair>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for pair in iter {
            catalog.insert(pair);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(kernel: &str, suffix: &str) -> PackagePair {
        PackagePair::new(
            kernel,
            format!("http://mirror/kernel-{kernel}-{suffix}.deb"),
            format!("http://mirror/debug-{kernel}-{suffix}.deb"),
        )
    }

    #[test]
    fn filter_parse() {
        assert_eq!(KernelFilter::parse("all"), KernelFilter::All);
        assert_eq!(
            KernelFilter::parse("5.15.0-91-generic"),
            KernelFilter::Exact("5.15.0-91-generic".into())
        );
    }

    #[test]
    fn filter_matches_exact_only() {
        let filter = KernelFilter::parse("5.15.0-91-generic");
        assert!(filter.matches("5.15.0-91-generic"));
        assert!(!filter.matches("5.15.0-92-generic"));
        assert!(KernelFilter::All.matches("anything"));
    }

    #[test]
    fn later_discovery_overwrites_earlier() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(pair("5.15.0-91", "a")).is_none());
        let replaced = catalog.insert(pair("5.15.0-91", "b")).unwrap();
        assert!(replaced.kernel_url.ends_with("-a.deb"));
        assert_eq!(catalog.len(), 1);
        assert!(catalog
            .get("5.15.0-91")
            .unwrap()
            .kernel_url
            .ends_with("-b.deb"));
    }

    #[test]
    fn new_pair_starts_unvalidated() {
        let p = pair("6.1.0-13", "x");
        assert!(!p.valid);
        assert!(p.banner.is_none());
        assert!(!p.isf_written);
    }
}
