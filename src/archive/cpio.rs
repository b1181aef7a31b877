//! Reader for cpio archives in `newc` format.
//!
//! RPM payloads are cpio streams; after payload decompression the members
//! are enumerated straight out of the buffer. Only the fields needed for
//! member lookup (name, file size) are decoded.

use crate::error::{BuilderError, Result};

const MAGIC_NEWC: &[u8] = b"070701";
const MAGIC_NEWCRC: &[u8] = b"070702";
const HEADER_LEN: usize = 110;
const TRAILER: &str = "TRAILER!!!";

/// One cpio member, borrowing the payload buffer.
#[derive(Debug)]
pub struct CpioEntry<'a> {
    pub name: String,
    pub data: &'a [u8],
}

fn hex_field(data: &[u8], offset: usize) -> Result<usize> {
    let field = data
        .get(offset..offset + 8)
        .ok_or_else(|| BuilderError::Format("truncated cpio header".into()))?;
    let text = std::str::from_utf8(field)
        .map_err(|_| BuilderError::Format("non-ascii cpio header field".into()))?;
    usize::from_str_radix(text, 16)
        .map_err(|_| BuilderError::Format(format!("bad cpio hex field '{text}'")))
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Enumerate all members of a `newc` cpio stream.
pub fn entries(data: &[u8]) -> Result<Vec<CpioEntry<'_>>> {
    let mut entries = Vec::new();
    let mut offset = 0;

    loop {
        let header = data
            .get(offset..offset + HEADER_LEN)
            .ok_or_else(|| BuilderError::Format("truncated cpio archive".into()))?;
        if &header[0..6] != MAGIC_NEWC && &header[0..6] != MAGIC_NEWCRC {
            return Err(BuilderError::Format(format!(
                "bad cpio magic at offset {offset}"
            )));
        }

        // Fields are 8-char ASCII hex: the ones we need are filesize
        // (7th field) and namesize (12th field).
        let file_size = hex_field(header, 6 + 8 * 6)?;
        let name_size = hex_field(header, 6 + 8 * 11)?;

        let name_start = offset + HEADER_LEN;
        let name_bytes = data
            .get(name_start..name_start + name_size)
            .ok_or_else(|| BuilderError::Format("truncated cpio member name".into()))?;
        // namesize counts the trailing NUL.
        let name = String::from_utf8_lossy(&name_bytes[..name_size.saturating_sub(1)]).into_owned();

        if name == TRAILER {
            return Ok(entries);
        }

        // Header plus name is padded to a 4-byte boundary, as is the data.
        let data_start = offset + align4(HEADER_LEN + name_size);
        let body = data
            .get(data_start..data_start + file_size)
            .ok_or_else(|| BuilderError::Format(format!("truncated cpio member '{name}'")))?;
        entries.push(CpioEntry { name, data: body });

        offset = data_start + align4(file_size);
    }
}
