//! Ubuntu resolver: security pool listing plus the ddebs debug mirror.
//!
//! Kernel packages are discovered through `linux-modules-*` entries (they
//! carry the full uname token in their filename) and paired with a
//! `linux-image-*` ddeb that embeds the same uname and architecture.

use log::{debug, info, warn};

use super::{pattern, require_branch};
use crate::catalog::{Catalog, KernelFilter, PackagePair};
use crate::error::Result;
use crate::fetch;

pub(crate) const SUPPORTED_BRANCHES: &[&str] =
    &["linux", "linux-aws", "linux-azure", "linux-gcp"];

const KERNEL_PATTERN: &str = r#"<a href="(linux-modules-(.*)_(.*)_(.*\.deb))">"#;
const DEBUG_PATTERN: &str = r#"<a href="(linux-image-.*?\.deb)">"#;

/// Listing entries skipped to prevent duplicate kernels.
const NOISE: &[&str] = &["-dbg", "extra-"];

pub(crate) fn resolve(branch: &str, filter: &KernelFilter) -> Result<Catalog> {
    require_branch(SUPPORTED_BRANCHES, branch, "ubuntu")?;

    let kernel_base = format!("http://security.ubuntu.com/ubuntu/pool/main/l/{branch}/");
    let debug_base = format!("http://ddebs.ubuntu.com/ubuntu/pool/main/l/{branch}/");

    info!("fetching kernel list from {kernel_base}");
    let kernel_page = fetch::get_text(&kernel_base)?;
    info!("fetching debug kernel list from {debug_base}");
    let debug_page = fetch::get_text(&debug_base)?;

    pair_listings(&kernel_page, &debug_page, &kernel_base, &debug_base, filter)
}

/// Pair kernel and debug listings; pure so listing fixtures can drive it.
pub(crate) fn pair_listings(
    kernel_page: &str,
    debug_page: &str,
    kernel_base: &str,
    debug_base: &str,
    filter: &KernelFilter,
) -> Result<Catalog> {
    let kernel_re = pattern(KERNEL_PATTERN)?;
    let debug_re = pattern(DEBUG_PATTERN)?;

    let debug_debs: Vec<&str> = debug_re
        .captures_iter(debug_page)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let mut catalog = Catalog::new();
    for caps in kernel_re.captures_iter(kernel_page) {
        let deb_path = &caps[1];
        let uname = &caps[2];
        let arch = caps[4].trim_end_matches(".deb").to_owned();

        if NOISE.iter().any(|noise| deb_path.contains(noise)) {
            continue;
        }
        debug!("found {uname}");

        // The debug ddeb must embed both the uname and the architecture.
        let Some(debug_deb) = debug_debs
            .iter()
            .find(|deb| deb.contains(uname) && deb.contains(&arch))
        else {
            warn!("unable to find matching debug deb for {uname}");
            continue;
        };

        if !filter.matches(uname) {
            debug!("{uname} ignored by filter");
            continue;
        }

        catalog.insert(PackagePair::new(
            uname,
            format!("{kernel_base}{deb_path}"),
            format!("{debug_base}{debug_deb}"),
        ));
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KERNEL_PAGE: &str = r#"
<a href="linux-modules-5.15.0-91-generic_5.15.0-91.101_amd64.deb">link</a>
<a href="linux-modules-5.15.0-92-generic_5.15.0-92.102_amd64.deb">link</a>
<a href="linux-modules-extra-5.15.0-91-generic_5.15.0-91.101_amd64.deb">link</a>
<a href="linux-modules-5.15.0-93-generic_5.15.0-93.103_amd64.deb">link</a>
"#;

    const DEBUG_PAGE: &str = r#"
<a href="linux-image-5.15.0-91-generic-dbgsym_5.15.0-91.101_amd64.ddeb">x</a>
<a href="linux-image-unsigned-5.15.0-91-generic-dbgsym_5.15.0-91.101_amd64.deb">x</a>
<a href="linux-image-unsigned-5.15.0-92-generic-dbgsym_5.15.0-92.102_amd64.deb">x</a>
"#;

    const KERNEL_BASE: &str = "http://security.ubuntu.com/ubuntu/pool/main/l/linux/";
    const DEBUG_BASE: &str = "http://ddebs.ubuntu.com/ubuntu/pool/main/l/linux/";

    #[test]
    fn pairs_by_shared_uname_and_arch() {
        let catalog = pair_listings(
            KERNEL_PAGE,
            DEBUG_PAGE,
            KERNEL_BASE,
            DEBUG_BASE,
            &KernelFilter::All,
        )
        .unwrap();

        let pair = catalog.get("5.15.0-91-generic").unwrap();
        assert_eq!(
            pair.kernel_url,
            format!("{KERNEL_BASE}linux-modules-5.15.0-91-generic_5.15.0-91.101_amd64.deb")
        );
        assert_eq!(
            pair.debug_url,
            format!(
                "{DEBUG_BASE}linux-image-unsigned-5.15.0-91-generic-dbgsym_5.15.0-91.101_amd64.deb"
            )
        );
    }

    #[test]
    fn unpaired_kernel_is_dropped() {
        let catalog = pair_listings(
            KERNEL_PAGE,
            DEBUG_PAGE,
            KERNEL_BASE,
            DEBUG_BASE,
            &KernelFilter::All,
        )
        .unwrap();

        // 5.15.0-93 has no debug counterpart; extra- is denylisted noise.
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("5.15.0-93-generic").is_none());
    }

    #[test]
    fn exact_filter_yields_singleton_or_empty() {
        let exact = KernelFilter::parse("5.15.0-92-generic");
        let catalog =
            pair_listings(KERNEL_PAGE, DEBUG_PAGE, KERNEL_BASE, DEBUG_BASE, &exact).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("5.15.0-92-generic").is_some());

        let missing = KernelFilter::parse("4.4.0-1-generic");
        let catalog =
            pair_listings(KERNEL_PAGE, DEBUG_PAGE, KERNEL_BASE, DEBUG_BASE, &missing).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn unsupported_branch_fails_before_io() {
        assert!(resolve("linux-surface", &KernelFilter::All).is_err());
    }
}
