//! Fedora resolver: walks release directories across archive mirrors.
//!
//! Fedora moved its directory layout twice over the supported eras, so
//! every release is probed through an ordered list of candidate page
//! URLs until one responds. Debug packages are discovered first; the
//! runtime kernel URL is derived from the debuginfo URL by substring
//! substitution rather than scraped separately.

use log::{debug, info};

use super::{pattern, require_branch};
use crate::catalog::{Catalog, KernelFilter, PackagePair};
use crate::error::Result;
use crate::fetch;

const SEARCH_BASES: &[&str] = &[
    "https://archives.fedoraproject.org/pub/archive/fedora/linux/releases/",
    "https://archives.fedoraproject.org/pub/archive/fedora/linux/updates/",
    "http://ftp.pbone.net/mirror/download.fedora.redhat.com/pub/fedora/linux/releases/",
    "http://ftp.pbone.net/mirror/download.fedora.redhat.com/pub/fedora/linux/updates/",
];

const RELEASE_PATTERN: &str = r#"<a href=.*>([0-9]{1,2}/)</a>"#;
const DEBUG_PATTERN: &str = r#"<a href="(kernel-debuginfo-(.*?)\.rpm)">"#;

pub(crate) fn resolve(branch: &str, filter: &KernelFilter) -> Result<Catalog> {
    require_branch(&["linux"], branch, "fedora")?;

    let release_re = pattern(RELEASE_PATTERN)?;
    let mut catalog = Catalog::new();

    for base in SEARCH_BASES {
        let release_page = fetch::get_text(base)?;
        let releases: Vec<&str> = release_re
            .captures_iter(&release_page)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        info!("found {} releases for {base}", releases.len());

        for release in releases {
            let sub_path = debug_subpath(base, release);

            // Layout drifted across eras; probe both known variants.
            for page_url in [
                format!("{base}{release}Everything/x86_64/{sub_path}"),
                format!("{base}{release}x86_64/{sub_path}"),
            ] {
                debug!("checking {page_url}");
                match fetch::get_text(&page_url) {
                    Ok(page) => scan_debug_page(&mut catalog, &page, &page_url, filter)?,
                    Err(e) => debug!("skipping {page_url}: {e}"),
                }
            }
        }
    }

    Ok(catalog)
}

/// Debug subdirectory for a release, by directory-layout era.
fn debug_subpath(base: &str, release: &str) -> &'static str {
    let number: u32 = release.trim_end_matches('/').parse().unwrap_or(0);
    if number < 25 {
        "debug/"
    } else if base.contains("linux/releases/") {
        "debug/tree/Packages/k/"
    } else {
        "debug/Packages/k/"
    }
}

/// Collect debuginfo entries from one release page into the catalog.
fn scan_debug_page(
    catalog: &mut Catalog,
    page: &str,
    page_url: &str,
    filter: &KernelFilter,
) -> Result<()> {
    let debug_re = pattern(DEBUG_PATTERN)?;

    for caps in debug_re.captures_iter(page) {
        let rpm_name = &caps[1];
        let kernel = &caps[2];

        // kernel-debuginfo-common-* carries no vmlinux.
        if kernel.contains("common") {
            continue;
        }
        debug!("found {kernel} on {page_url}");

        let debug_url = format!("{page_url}{rpm_name}");
        let kernel_url = derive_kernel_url(&debug_url);

        if !filter.matches(kernel) {
            debug!("{kernel} ignored by filter");
            continue;
        }

        catalog.insert(PackagePair::new(kernel, kernel_url, debug_url));
    }

    Ok(())
}

/// Derive the runtime kernel rpm URL from its debuginfo URL.
///
/// The package name swaps `-debuginfo-` for `-core-`; the path segment
/// moves out of the debug tree in an era-dependent way.
pub(crate) fn derive_kernel_url(debug_url: &str) -> String {
    let renamed = debug_url.replace("-debuginfo-", "-core-");
    if debug_url.contains("/tree/Packages/") {
        renamed.replace("/debug/tree/Packages/", "/os/Packages/")
    } else if debug_url.contains("Everything/") {
        renamed.replace("/debug/", "/os/Packages/")
    } else {
        renamed.replace("/debug/", "/")
    }
}
