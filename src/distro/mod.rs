//! Catalog resolution, one strategy per supported distribution.
//!
//! Each submodule is configured by data: mirror URL templates, package
//! name patterns, a noise denylist, and a pairing rule correlating a
//! kernel package with its debug-symbol counterpart. The resolvers share
//! one contract: validate the branch before any network I/O, scrape the
//! upstream listings, pair, apply the kernel filter, and return an
//! immutable catalog.

pub mod amazon;
pub mod debian;
pub mod fedora;
pub mod mariner;
pub mod ubuntu;

use crate::catalog::{Catalog, KernelFilter};
use crate::error::{BuilderError, Result};

/// Distribution names accepted on the command line.
pub const SUPPORTED: &[&str] = &["ubuntu", "debian", "fedora", "amazon", "cbl-mariner"];

/// A supported distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Ubuntu,
    Debian,
    Fedora,
    Amazon,
    CblMariner,
}

impl Distro {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ubuntu" => Ok(Self::Ubuntu),
            "debian" => Ok(Self::Debian),
            "fedora" => Ok(Self::Fedora),
            "amazon" | "amazonlinux" => Ok(Self::Amazon),
            "cbl-mariner" | "mariner" => Ok(Self::CblMariner),
            other => Err(BuilderError::Config(format!(
                "unsupported distribution '{}'; expected one of: {}",
                other,
                SUPPORTED.join(", ")
            ))),
        }
    }

    /// Directory name used under `symbol_files/`.
    pub fn os_name(&self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Debian => "debian",
            Self::Fedora => "fedora",
            Self::Amazon => "amazonlinux",
            Self::CblMariner => "cbl-mariner",
        }
    }

    /// Branch assumed when none is given on the command line.
    pub fn default_branch(&self) -> &'static str {
        match self {
            Self::Amazon => "2",
            _ => "linux",
        }
    }

    /// Member pattern locating the symbol map inside the kernel package.
    pub fn map_pattern(&self, _kernel: &str) -> String {
        "System.map".into()
    }

    /// Member pattern locating the debug image inside the debug package.
    ///
    /// Debian-family packages park it under `boot/`; rpm debuginfo trees
    /// bury it deeper, and Mariner needs the version-qualified name to
    /// avoid the `vmlinux.h` header shipped next to it.
    pub fn image_pattern(&self, kernel: &str) -> String {
        match self {
            Self::Ubuntu | Self::Debian => "boot/vmlinux".into(),
            Self::Fedora | Self::Amazon => "vmlinux".into(),
            Self::CblMariner => format!("vmlinux-{}", kernel.replace(".x86_64", "")),
        }
    }

    /// Resolve the catalog of paired kernel/debug packages for `branch`,
    /// keeping only kernels accepted by `filter`.
    pub fn resolve(&self, branch: &str, filter: &KernelFilter) -> Result<Catalog> {
        match self {
            Self::Ubuntu => ubuntu::resolve(branch, filter),
            Self::Debian => debian::resolve(branch, filter),
            Self::Fedora => fedora::resolve(branch, filter),
            Self::Amazon => amazon::resolve(branch, filter),
            Self::CblMariner => mariner::resolve(branch, filter),
        }
    }
}

/// Compile a listing pattern, surfacing a broken pattern as a
/// configuration error rather than a panic.
pub(crate) fn pattern(re: &str) -> Result<regex::Regex> {
    regex::Regex::new(re).map_err(|e| BuilderError::Config(format!("bad package pattern: {e}")))
}

/// Reject an unsupported branch before any network I/O happens.
pub(crate) fn require_branch(supported: &[&str], branch: &str, distro: &str) -> Result<()> {
    if supported.contains(&branch) {
        Ok(())
    } else {
        Err(BuilderError::Config(format!(
            "unsupported branch '{}' for {}; expected one of: {}",
            branch,
            distro,
            supported.join(", ")
        )))
    }
}
