//! Source packing: zlib-compress the original document and base64 it.
//!
//! The result becomes the `[markdown]:data:text/plain;base64,…` definition,
//! which is what makes an embedded document recoverable.
//!
//! Unpacking also accepts bzip2 streams (`BZh` magic), the format older
//! `emd` releases wrote. Packing always produces zlib.

use crate::error::EmdError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bzip2::read::BzDecoder;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tracing::debug;

const BZIP2_MAGIC: &[u8] = b"BZh";

/// Compress `source` at `level` (0–9) and base64-encode the result.
pub fn pack_source(source: &[u8], level: u32) -> Result<String, EmdError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder
        .write_all(source)
        .map_err(EmdError::CompressionFailed)?;
    let compressed = encoder.finish().map_err(EmdError::CompressionFailed)?;

    let b64 = STANDARD.encode(&compressed);
    debug!(
        "Packed source {} bytes → {} compressed → {} base64",
        source.len(),
        compressed.len(),
        b64.len()
    );
    Ok(b64)
}

/// Reverse [`pack_source`].
pub fn unpack_source(b64: &str) -> Result<Vec<u8>, EmdError> {
    let corrupt = |detail: String| EmdError::CorruptPayload {
        id: crate::pipeline::assemble::SOURCE_ID.to_string(),
        detail,
    };

    let compressed = STANDARD
        .decode(b64.trim())
        .map_err(|e| corrupt(format!("base64: {e}")))?;

    let mut out = Vec::new();
    if compressed.starts_with(BZIP2_MAGIC) {
        debug!("Source payload is bzip2");
        BzDecoder::new(compressed.as_slice())
            .read_to_end(&mut out)
            .map_err(|e| corrupt(format!("bzip2: {e}")))?;
    } else {
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut out)
            .map_err(|e| corrupt(format!("zlib: {e}")))?;
    }
    Ok(out)
}
