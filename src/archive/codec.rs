//! Compression codec sniffing and one-shot decompression.
//!
//! Package payloads vary codec silently across build eras (legacy gzip,
//! newer zstd, xz in between), so callers never assume a codec: they sniff
//! the magic and get back one normalized decompressed buffer regardless of
//! which path was taken.

use std::io::Read;

use crate::error::{BuilderError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];
const XZ_MAGIC: [u8; 6] = [0xfd, b'7', b'z', b'X', b'Z', 0x00];

/// Compression codec of a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    None,
    Gzip,
    Zstd,
    Xz,
}

/// Sniff the codec from the buffer's leading magic bytes.
pub fn detect(data: &[u8]) -> Codec {
    if data.starts_with(&GZIP_MAGIC) {
        Codec::Gzip
    } else if data.starts_with(&ZSTD_MAGIC) {
        Codec::Zstd
    } else if data.starts_with(&XZ_MAGIC) {
        Codec::Xz
    } else {
        Codec::None
    }
}

/// Decompress a buffer according to its sniffed codec.
///
/// `Codec::None` returns the input unchanged.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    match detect(data) {
        Codec::None => Ok(data.to_vec()),
        Codec::Gzip => {
            let mut out = Vec::new();
            flate2::read::GzDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| BuilderError::Format(format!("gzip payload: {e}")))?;
            Ok(out)
        }
        Codec::Zstd => zstd::decode_all(data)
            .map_err(|e| BuilderError::Format(format!("zstd payload: {e}"))),
        Codec::Xz => {
            let mut out = Vec::new();
            xz2::read::XzDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| BuilderError::Format(format!("xz payload: {e}")))?;
            Ok(out)
        }
    }
}
