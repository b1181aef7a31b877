//! Minimal reader for the Unix common archive (`ar`) format.
//!
//! Debian packages are an `ar` archive wrapping three members
//! (`debian-binary`, `control.tar.*`, `data.tar.*`). Only the flat member
//! walk is needed here; GNU long-name tables do not occur in `.deb` files
//! because member names fit the 16-byte field.

use crate::error::{BuilderError, Result};

const GLOBAL_MAGIC: &[u8] = b"!<arch>\n";
const ENTRY_MAGIC: &[u8] = b"`\n";
const HEADER_LEN: usize = 60;

/// One member of an `ar` archive, borrowing the archive buffer.
#[derive(Debug)]
pub struct ArMember<'a> {
    pub name: String,
    pub data: &'a [u8],
}

/// Whether the buffer carries the `ar` global magic.
pub fn is_ar(data: &[u8]) -> bool {
    data.starts_with(GLOBAL_MAGIC)
}

/// Walk all members of an `ar` archive.
pub fn members(data: &[u8]) -> Result<Vec<ArMember<'_>>> {
    if !is_ar(data) {
        return Err(BuilderError::Format("missing ar global header".into()));
    }

    let mut members = Vec::new();
    let mut offset = GLOBAL_MAGIC.len();

    while offset < data.len() {
        let header = data
            .get(offset..offset + HEADER_LEN)
            .ok_or_else(|| BuilderError::Format("truncated ar member header".into()))?;
        if &header[58..60] != ENTRY_MAGIC {
            return Err(BuilderError::Format(format!(
                "bad ar member magic at offset {offset}"
            )));
        }

        // Name field is 16 bytes, padded with spaces; GNU style appends '/'.
        let name = String::from_utf8_lossy(&header[0..16])
            .trim_end()
            .trim_end_matches('/')
            .to_owned();
        let size: usize = String::from_utf8_lossy(&header[48..58])
            .trim()
            .parse()
            .map_err(|_| BuilderError::Format(format!("bad ar member size for '{name}'")))?;

        let start = offset + HEADER_LEN;
        let body = data
            .get(start..start + size)
            .ok_or_else(|| BuilderError::Format(format!("truncated ar member '{name}'")))?;
        members.push(ArMember { name, data: body });

        // Member data is 2-byte aligned.
        offset = start + size + (size & 1);
    }

    Ok(members)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an `ar` archive from (name, data) members. Shared with the deb
    /// extraction tests.
    pub(crate) fn build_ar(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = Vec::from(GLOBAL_MAGIC);
        for (name, data) in members {
            out.extend_from_slice(format!("{:<16}", name).as_bytes());
            out.extend_from_slice(format!("{:<12}", 0).as_bytes()); // mtime
            out.extend_from_slice(format!("{:<6}", 0).as_bytes()); // uid
            out.extend_from_slice(format!("{:<6}", 0).as_bytes()); // gid
            out.extend_from_slice(format!("{:<8}", "100644").as_bytes());
            out.extend_from_slice(format!("{:<10}", data.len()).as_bytes());
            out.extend_from_slice(ENTRY_MAGIC);
            out.extend_from_slice(data);
            if data.len() % 2 == 1 {
                out.push(b'\n');
            }
        }
        out
    }

    #[test]
    fn walks_members_in_order() {
        let archive = build_ar(&[
            ("debian-binary", b"2.0\n"),
            ("control.tar.gz", b"ctrl"),
            ("data.tar.gz", b"payload"),
        ]);

        let members = members(&archive).unwrap();
        assert_eq!(members.len(), 3);
        assert_eq!(members[0].name, "debian-binary");
        assert_eq!(members[2].name, "data.tar.gz");
        assert_eq!(members[2].data, b"payload");
    }

    #[test]
    fn odd_sized_members_stay_aligned() {
        let archive = build_ar(&[("a", b"xyz"), ("b", b"pqrs")]);
        let members = members(&archive).unwrap();
        assert_eq!(members[0].data, b"xyz");
        assert_eq!(members[1].data, b"pqrs");
    }

    #[test]
    fn gnu_name_slash_is_stripped() {
        let archive = build_ar(&[("data.tar.zst/", b"z")]);
        let members = members(&archive).unwrap();
        assert_eq!(members[0].name, "data.tar.zst");
    }

    #[test]
    fn rejects_non_ar_input() {
        assert!(members(b"not an archive").is_err());
    }

    #[test]
    fn rejects_truncated_member() {
        let mut archive = build_ar(&[("data.tar.gz", b"payload")]);
        archive.truncate(archive.len() - 3);
        assert!(members(&archive).is_err());
    }
}
