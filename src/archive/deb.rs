//! Member extraction from Debian/Ubuntu package archives.
//!
//! A `.deb` is an `ar` archive wrapping a compressed tar data member. The
//! data member's codec drifts across build eras: legacy packages carry
//! `data.tar.gz`, newer Ubuntu builds `data.tar.zst`, Debian proper often
//! `data.tar.xz`. The gzip member is tried first; any structural failure
//! (absent member, bad magic, broken stream) falls back to explicitly
//! locating an alternate-named data member and opening its decompressed
//! bytes as a plain tar stream.

use std::io::Read;

use flate2::read::GzDecoder;
use log::debug;

use super::{ar, codec};
use crate::error::{BuilderError, Result};

/// Alternate data member names probed when the gzip path fails.
const FALLBACK_DATA_MEMBERS: &[&str] = &["data.tar.zst", "data.tar.xz", "data.tar"];

/// Extract the first data-member file whose path contains `pattern`.
///
/// Returns `Ok(None)` when the archive is readable but no member path
/// matches; that is an expected outcome, not a failure.
pub fn extract_member(deb: &[u8], pattern: &str) -> Result<Option<(String, Vec<u8>)>> {
    let members = ar::members(deb)?;

    // Primary path: the conventional gzip data member, streamed straight
    // into the tar reader.
    if let Some(member) = members.iter().find(|m| m.name == "data.tar.gz") {
        match search_tar(tar::Archive::new(GzDecoder::new(member.data)), pattern) {
            Ok(found) => return Ok(found),
            Err(e) => debug!("gzip data member unreadable ({e}), trying fallback codecs"),
        }
    }

    // Fallback path: alternate-named data members, decompressed up front
    // and opened as a plain tar stream.
    for name in FALLBACK_DATA_MEMBERS {
        if let Some(member) = members.iter().find(|m| &m.name == name) {
            let plain = codec::decompress(member.data)?;
            return search_tar(tar::Archive::new(plain.as_slice()), pattern);
        }
    }

    Err(BuilderError::Format(
        "no readable data member in deb archive".into(),
    ))
}

fn search_tar<R: Read>(
    mut archive: tar::Archive<R>,
    pattern: &str,
) -> Result<Option<(String, Vec<u8>)>> {
    let entries = archive
        .entries()
        .map_err(|e| BuilderError::Format(format!("deb data member: {e}")))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| BuilderError::Format(format!("deb data member: {e}")))?;
        let path = entry
            .path()
            .map_err(|e| BuilderError::Format(format!("deb member path: {e}")))?
            .to_string_lossy()
            .into_owned();

        if path.contains(pattern) {
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| BuilderError::Format(format!("deb member '{path}': {e}")))?;
            return Ok(Some((path, data)));
        }
    }

    Ok(None)
}
