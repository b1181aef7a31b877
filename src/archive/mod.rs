//! Package archive handling: format detection, member search, extraction.
//!
//! Two container families are supported, detected by magic:
//!
//! - rpm: a compressed-cpio payload behind the rpm lead and headers
//! - deb: an `ar` archive wrapping a compressed tar data member
//!
//! One extraction call fetches the archive fully into memory, finds the
//! first member whose path contains a plain substring pattern, and writes
//! its bytes to a named temporary file. The temp file deletes itself on
//! drop; the caller keeps it alive for exactly one kernel's processing.

pub mod ar;
pub mod codec;
pub mod cpio;
pub mod deb;
pub mod rpm;

use std::io::Write;

use log::{debug, info};
use tempfile::TempPath;

use crate::error::{BuilderError, Result};
use crate::fetch;

/// Container family of a fetched package buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Deb,
    Rpm,
}

/// Detect the container family from the buffer's leading magic.
pub fn detect_kind(data: &[u8]) -> Result<PackageKind> {
    if ar::is_ar(data) {
        Ok(PackageKind::Deb)
    } else if rpm::is_rpm(data) {
        Ok(PackageKind::Rpm)
    } else {
        Err(BuilderError::Format(
            "unrecognized package archive magic".into(),
        ))
    }
}

/// One extracted member, parked in a self-deleting temporary file.
#[derive(Debug)]
pub struct ExtractedFile {
    /// Path of the temp file; the file is removed when this is dropped.
    pub path: TempPath,
    /// Member path inside the archive it was extracted from.
    pub member: String,
}

/// Filename prefix for an extracted member, so downstream stages can tell
/// the debug image from the symbol map without re-inspecting content.
fn output_prefix(member: &str) -> &'static str {
    if member.contains("vmlinux") {
        "vmlinux"
    } else {
        "System.map"
    }
}

/// Fetch a package archive and extract the first member whose path
/// contains `pattern`.
///
/// Returns `Ok(None)` when the archive is valid but carries no matching
/// member.
pub fn extract_member(url: &str, pattern: &str) -> Result<Option<ExtractedFile>> {
    info!("fetching package {url}");
    let buffer = fetch::get_bytes(url)?;
    debug!("fetched {} bytes, searching for '{pattern}'", buffer.len());

    let found = match detect_kind(&buffer)? {
        PackageKind::Deb => deb::extract_member(&buffer, pattern)?,
        PackageKind::Rpm => rpm::extract_member(&buffer, pattern)?,
    };

    let Some((member, data)) = found else {
        debug!("no member matching '{pattern}' in {url}");
        return Ok(None);
    };

    let mut file = tempfile::Builder::new()
        .prefix(output_prefix(&member))
        .tempfile()?;
    file.write_all(&data)?;
    file.flush()?;
    debug!("extracted {member} to {}", file.path().display());

    Ok(Some(ExtractedFile {
        path: file.into_temp_path(),
        member,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_deb_and_rpm_magic() {
        assert_eq!(detect_kind(b"!<arch>\nrest").unwrap(), PackageKind::Deb);
        assert_eq!(
            detect_kind(&[0xed, 0xab, 0xee, 0xdb, 0x03, 0x00]).unwrap(),
            PackageKind::Rpm
        );
        assert!(detect_kind(b"PK\x03\x04").is_err());
    }

    #[test]
    fn prefix_tracks_member_kind() {
        assert_eq!(output_prefix("./boot/vmlinux-5.15.0-91-generic"), "vmlinux");
        assert_eq!(
            output_prefix("./boot/System.map-5.15.0-91-generic"),
            "System.map"
        );
    }

    #[test]
    fn temp_file_is_removed_on_drop() {
        let extracted = {
            let mut file = tempfile::Builder::new().prefix("vmlinux").tempfile().unwrap();
            file.write_all(b"elf bytes").unwrap();
            ExtractedFile {
                path: file.into_temp_path(),
                member: "./boot/vmlinux-test".into(),
            }
        };
        let path = extracted.path.to_path_buf();
        assert!(path.exists());
        drop(extracted);
        assert!(!path.exists());
    }
}
