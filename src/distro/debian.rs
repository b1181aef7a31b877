//! Debian resolver: one pool listing carries both kernel and debug debs.
//!
//! The kernel identifier is the filename segment between `linux-image-`
//! and the first underscore (minus any `-unsigned` marker). The debug
//! counterpart is the first listing entry, in discovery order, whose name
//! starts with `linux-image-<kernel>-dbg`. When several builds share a
//! version prefix this first-match tie-break can mis-pair; it is kept as
//! the documented best-effort behavior.

use log::{debug, info, warn};

use super::{pattern, require_branch};
use crate::catalog::{Catalog, KernelFilter, PackagePair};
use crate::error::Result;
use crate::fetch;

pub(crate) const SUPPORTED_BRANCHES: &[&str] =
    &["linux", "linux-aws", "linux-azure", "linux-gcp"];

const POOL_URL: &str = "http://ftp.us.debian.org/debian/pool/main/l/linux/";
const SEARCH_PATTERN: &str = r#"<a href="(linux-image-(.*?)_.*?deb)">"#;

pub(crate) fn resolve(branch: &str, filter: &KernelFilter) -> Result<Catalog> {
    require_branch(SUPPORTED_BRANCHES, branch, "debian")?;

    info!("fetching kernel list from {POOL_URL}");
    let pool_page = fetch::get_text(POOL_URL)?;
    pair_listing(&pool_page, POOL_URL, filter)
}

/// Pair kernels with debug packages out of one pool listing; pure so
/// listing fixtures can drive it.
pub(crate) fn pair_listing(
    pool_page: &str,
    pool_base: &str,
    filter: &KernelFilter,
) -> Result<Catalog> {
    let search_re = pattern(SEARCH_PATTERN)?;

    let entries: Vec<(&str, &str)> = search_re
        .captures_iter(pool_page)
        .filter_map(|caps| {
            match (caps.get(1), caps.get(2)) {
                (Some(path), Some(kernel)) => Some((path.as_str(), kernel.as_str())),
                _ => None,
            }
        })
        .collect();

    let mut catalog = Catalog::new();
    for &(deb_path, raw_kernel) in &entries {
        let kernel = raw_kernel
            .split("-unsigned")
            .next()
            .unwrap_or(raw_kernel);

        // Debug packages show up in the same listing; skip them here.
        if kernel.contains("-dbg") {
            continue;
        }
        debug!("found {kernel}");

        let dbg_prefix = format!("linux-image-{kernel}-dbg");
        let Some(&(debug_path, _)) = entries
            .iter()
            .find(|(path, _)| path.contains(&dbg_prefix))
        else {
            warn!("unable to find matching debug deb for {kernel}");
            continue;
        };

        if !filter.matches(kernel) {
            debug!("{kernel} ignored by filter");
            continue;
        }

        catalog.insert(PackagePair::new(
            kernel,
            format!("{pool_base}{deb_path}"),
            format!("{pool_base}{debug_path}"),
        ));
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL_PAGE: &str = r#"
<a href="linux-image-6.1.0-13-amd64_6.1.55-1_amd64.deb">x</a>
<a href="linux-image-6.1.0-13-amd64-dbg_6.1.55-1_amd64.deb">x</a>
<a href="linux-image-6.1.0-13-amd64-unsigned_6.1.55-1_amd64.deb">x</a>
<a href="linux-image-6.5.0-5-amd64_6.5.13-1_amd64.deb">x</a>
"#;

    #[test]
    fn pairs_by_derived_dbg_prefix() {
        let catalog = pair_listing(POOL_PAGE, POOL_URL, &KernelFilter::All).unwrap();

        // The signed and unsigned entries resolve to the same identifier;
        // the later (unsigned) discovery wins the kernel slot.
        let pair = catalog.get("6.1.0-13-amd64").unwrap();
        assert_eq!(
            pair.kernel_url,
            format!("{POOL_URL}linux-image-6.1.0-13-amd64-unsigned_6.1.55-1_amd64.deb")
        );
        assert_eq!(
            pair.debug_url,
            format!("{POOL_URL}linux-image-6.1.0-13-amd64-dbg_6.1.55-1_amd64.deb")
        );
    }

    #[test]
    fn unsigned_marker_is_stripped_from_the_identifier() {
        let catalog = pair_listing(POOL_PAGE, POOL_URL, &KernelFilter::All).unwrap();
        assert!(catalog.get("6.1.0-13-amd64").is_some());
        assert!(catalog.get("6.1.0-13-amd64-unsigned").is_none());
    }

    #[test]
    fn kernel_without_debug_counterpart_is_dropped() {
        let catalog = pair_listing(POOL_PAGE, POOL_URL, &KernelFilter::All).unwrap();
        assert!(catalog.get("6.5.0-5-amd64").is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn exact_filter_selects_one_kernel() {
        let filter = KernelFilter::parse("6.1.0-13-amd64");
        let catalog = pair_listing(POOL_PAGE, POOL_URL, &filter).unwrap();
        assert_eq!(catalog.len(), 1);

        let filter = KernelFilter::parse("3.16.0-4-amd64");
        let catalog = pair_listing(POOL_PAGE, POOL_URL, &filter).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn unsupported_branch_fails_before_io() {
        assert!(resolve("linux-rt", &KernelFilter::All).is_err());
    }
}
