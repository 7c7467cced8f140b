//! Reading the hidden block back out of an embedded document.
//!
//! This is the read side of the format written by
//! [`crate::pipeline::assemble`]: enough to get the original source and
//! every image payload back. Recreating the image files on disk is left to
//! the caller.

use crate::error::EmdError;
use crate::pipeline::assemble::{
    MediaKind, ReferenceDefinition, BLOCK_CLOSE, BLOCK_OPEN, SOURCE_ID,
};
use crate::pipeline::pack::unpack_source;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([^\]]+)\]:data:([^;,\s]+);base64,([A-Za-z0-9+/=]*)(?:\s+(.+))?$").unwrap()
});

/// Parse every definition in the last hidden block of `text`.
///
/// Definitions with a media type this crate never writes are skipped.
pub fn parse_definitions(text: &str) -> Result<Vec<ReferenceDefinition>, EmdError> {
    let start = text.rfind(BLOCK_OPEN).ok_or(EmdError::NoEncodedBlock)?;
    let body = &text[start + BLOCK_OPEN.len()..];
    let end = body.rfind(BLOCK_CLOSE).ok_or(EmdError::NoEncodedBlock)?;

    let mut defs = Vec::new();
    for line in body[..end].split(['\r', '\n']).map(str::trim) {
        if line.is_empty() {
            continue;
        }
        let Some(caps) = RE_DEFINITION.captures(line) else {
            debug!("Skipping non-definition line in encoded block");
            continue;
        };
        let Some(media) = MediaKind::from_mime(&caps[2]) else {
            debug!("Skipping [{}] with media type {}", &caps[1], &caps[2]);
            continue;
        };
        defs.push(ReferenceDefinition {
            id: caps[1].to_string(),
            media,
            payload: caps[3].to_string(),
            title: caps.get(4).map(|m| unquote_title(m.as_str()).to_string()),
        });
    }
    Ok(defs)
}

/// Recover the exact bytes of the document before embedding.
pub fn extract_source(text: &str) -> Result<Vec<u8>, EmdError> {
    let defs = parse_definitions(text)?;
    let def = defs
        .iter()
        .find(|d| d.id == SOURCE_ID)
        .ok_or(EmdError::MissingSourceDefinition)?;
    decode_payload(def)
}

/// Decode a definition payload: raw PNG bytes, or the decompressed source.
pub fn decode_payload(def: &ReferenceDefinition) -> Result<Vec<u8>, EmdError> {
    match def.media {
        MediaKind::CompressedSource => unpack_source(&def.payload),
        MediaKind::Png => STANDARD
            .decode(&def.payload)
            .map_err(|e| EmdError::CorruptPayload {
                id: def.id.clone(),
                detail: format!("base64: {e}"),
            }),
    }
}

fn unquote_title(raw: &str) -> &str {
    let raw = raw.trim();
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        let quoted = matches!((first, last), (b'"', b'"') | (b'\'', b'\'') | (b'(', b')'));
        if quoted {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}
