//! Amazon Linux resolver: mirror indirection plus compressed XML feeds.
//!
//! The published entry point is a `mirror.list` whose first line is the
//! actual repository base. Package paths are then scraped out of the
//! gzip-compressed `repodata/primary.xml.gz` feed for both the core and
//! debuginfo repositories, and paired by exact shared version token.

use log::{debug, info, warn};

use super::{pattern, require_branch};
use crate::catalog::{Catalog, KernelFilter, PackagePair};
use crate::error::Result;
use crate::fetch;

const BASE_URL: &str = "http://amazonlinux.us-east-1.amazonaws.com";

const KERNEL_PATTERN: &str = r"(/blobstore/.*?/kernel-([0-9].*?)\.rpm)";
const DEBUG_PATTERN: &str = r"(/blobstore/.*?/kernel-debuginfo-([0-9].*?)\.rpm)";

pub(crate) fn resolve(branch: &str, filter: &KernelFilter) -> Result<Catalog> {
    require_branch(&["2"], branch, "amazon")?;

    let kernel_list = format!("{BASE_URL}/{branch}/core/latest/x86_64/mirror.list");
    let debug_list = format!("{BASE_URL}/{branch}/core/latest/debuginfo/x86_64/mirror.list");

    info!("fetching kernel feed via {kernel_list}");
    let kernel_xml = fetch_primary_feed(&kernel_list)?;
    info!("fetching debug kernel feed via {debug_list}");
    let debug_xml = fetch_primary_feed(&debug_list)?;

    pair_feeds(&kernel_xml, &debug_xml, filter)
}

/// Follow the mirror indirection and pull the decompressed primary feed.
fn fetch_primary_feed(mirror_list_url: &str) -> Result<String> {
    let mirror_list = fetch::get_text(mirror_list_url)?;
    let mirror = mirror_list.lines().next().unwrap_or("").trim();
    fetch::get_gzipped_text(&format!("{mirror}/repodata/primary.xml.gz"))
}

/// Pair kernel and debuginfo feed entries by exact shared version token;
/// pure so feed fixtures can drive it.
pub(crate) fn pair_feeds(
    kernel_xml: &str,
    debug_xml: &str,
    filter: &KernelFilter,
) -> Result<Catalog> {
    let kernel_re = pattern(KERNEL_PATTERN)?;
    let debug_re = pattern(DEBUG_PATTERN)?;

    let debug_rpms: Vec<(&str, &str)> = debug_re
        .captures_iter(debug_xml)
        .filter_map(|caps| match (caps.get(1), caps.get(2)) {
            (Some(path), Some(version)) => Some((path.as_str(), version.as_str())),
            _ => None,
        })
        .collect();

    let mut catalog = Catalog::new();
    for caps in kernel_re.captures_iter(kernel_xml) {
        let kernel_rpm = &caps[1];
        let kernel = &caps[2];

        let Some(&(debug_rpm, _)) = debug_rpms
            .iter()
            .find(|(_, version)| *version == kernel)
        else {
            warn!("unable to find matching debuginfo rpm for {kernel}");
            continue;
        };

        if !filter.matches(kernel) {
            debug!("{kernel} ignored by filter");
            continue;
        }

        catalog.insert(PackagePair::new(
            kernel,
            format!("{BASE_URL}{kernel_rpm}"),
            format!("{BASE_URL}{debug_rpm}"),
        ));
    }

    Ok(catalog)
}
