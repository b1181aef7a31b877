//! CBL-Mariner resolver: Microsoft yum repositories.
//!
//! Both the `prod` and `preview` repository folders are scanned. There is
//! no debug listing to correlate against: the debuginfo URL is derived
//! from the kernel filename by inserting the `-debuginfo` marker and
//! switching to the sibling debuginfo repository.

use log::{debug, info};

use super::{pattern, require_branch};
use crate::catalog::{Catalog, KernelFilter, PackagePair};
use crate::error::Result;
use crate::fetch;

const BASE_URL: &str = "https://packages.microsoft.com/yumrepos";
const KERNEL_PATTERN: &str = r#"<a href="(kernel-([0-9]+.*?)\.rpm)">"#;
const FOLDERS: &[&str] = &["prod", "preview"];

pub(crate) fn resolve(branch: &str, filter: &KernelFilter) -> Result<Catalog> {
    require_branch(&["linux"], branch, "cbl-mariner")?;

    let mut catalog = Catalog::new();
    for folder in FOLDERS {
        let repo_url = format!("{BASE_URL}/cbl-mariner-2.0-{folder}-base-x86_64");
        let debug_repo_url = format!("{BASE_URL}/cbl-mariner-2.0-{folder}-base-debuginfo-x86_64");
        info!("fetching kernel list from {repo_url}");

        match fetch::get_text(&repo_url) {
            Ok(page) => scan_listing(&mut catalog, &page, &repo_url, &debug_repo_url, filter)?,
            Err(e) => debug!("skipping {repo_url}: {e}"),
        }
    }

    Ok(catalog)
}

/// Collect kernels from one repository listing; pure so listing fixtures
/// can drive it.
pub(crate) fn scan_listing(
    catalog: &mut Catalog,
    page: &str,
    repo_url: &str,
    debug_repo_url: &str,
    filter: &KernelFilter,
) -> Result<()> {
    let kernel_re = pattern(KERNEL_PATTERN)?;

    for caps in kernel_re.captures_iter(page) {
        let rpm_name = &caps[1];
        let kernel = &caps[2];

        // The filter value is a bare `uname -r`; listing entries carry the
        // architecture suffix.
        let wanted = match filter {
            KernelFilter::All => true,
            KernelFilter::Exact(id) => *kernel == format!("{id}.x86_64"),
        };
        if !wanted {
            debug!("{kernel} ignored by filter");
            continue;
        }

        catalog.insert(PackagePair::new(
            kernel,
            format!("{repo_url}/{rpm_name}"),
            format!("{debug_repo_url}/kernel-debuginfo-{kernel}.rpm"),
        ));
    }

    Ok(())
}
