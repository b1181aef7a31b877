//! Member extraction from RPM package archives.
//!
//! An RPM is a 96-byte lead, a signature header, a main header, and then
//! the payload: a compressed cpio stream. The payload codec is not trusted
//! from the header tags; it is sniffed from the payload magic instead,
//! which holds up across gzip, xz, and zstd build eras.

use super::{codec, cpio};
use crate::error::{BuilderError, Result};

const LEAD_LEN: usize = 96;
const LEAD_MAGIC: [u8; 4] = [0xed, 0xab, 0xee, 0xdb];
const HEADER_MAGIC: [u8; 4] = [0x8e, 0xad, 0xe8, 0x01];

/// Whether the buffer carries the RPM lead magic.
pub fn is_rpm(data: &[u8]) -> bool {
    data.starts_with(&LEAD_MAGIC)
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or_else(|| BuilderError::Format("truncated rpm header".into()))?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Length of a header section: magic + reserved, index entries, data blob.
fn header_section_len(data: &[u8], offset: usize) -> Result<usize> {
    let magic = data
        .get(offset..offset + 4)
        .ok_or_else(|| BuilderError::Format("truncated rpm header".into()))?;
    if magic != HEADER_MAGIC {
        return Err(BuilderError::Format(format!(
            "bad rpm header magic at offset {offset}"
        )));
    }
    let index_count = read_u32(data, offset + 8)? as usize;
    let data_len = read_u32(data, offset + 12)? as usize;
    Ok(16 + index_count * 16 + data_len)
}

/// Decompress the cpio payload of an RPM buffer.
pub fn payload(rpm: &[u8]) -> Result<Vec<u8>> {
    if !is_rpm(rpm) {
        return Err(BuilderError::Format("missing rpm lead magic".into()));
    }

    // Signature header follows the lead and is padded to 8 bytes; the main
    // header follows unpadded, then the payload.
    let sig_len = header_section_len(rpm, LEAD_LEN)?;
    let main_offset = LEAD_LEN + sig_len + (8 - sig_len % 8) % 8;
    let main_len = header_section_len(rpm, main_offset)?;

    let payload = rpm
        .get(main_offset + main_len..)
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| BuilderError::Format("rpm has no payload".into()))?;

    codec::decompress(payload)
}

/// Extract the first payload file whose path contains `pattern`.
///
/// Returns `Ok(None)` when the payload is readable but no member path
/// matches; that is an expected outcome, not a failure.
pub fn extract_member(rpm: &[u8], pattern: &str) -> Result<Option<(String, Vec<u8>)>> {
    let cpio_stream = payload(rpm)?;

    for entry in cpio::entries(&cpio_stream)? {
        if entry.name.contains(pattern) {
            return Ok(Some((entry.name, entry.data.to_vec())));
        }
    }

    Ok(None)
}
