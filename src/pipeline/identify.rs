//! Content identifiers: digest → base-32 → first 8 characters.
//!
//! The identifier depends on the payload bytes only, never on the location
//! or alt-text, so two references to byte-identical files share one
//! definition.

use crate::config::DigestAlgorithm;
use data_encoding::BASE32;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;

/// Number of base-32 characters kept from the digest.
pub const ID_LEN: usize = 8;

/// An 8-character uppercase base-32 identifier (`[A-Z2-7]{8}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the identifier for `bytes`.
pub fn content_id(bytes: &[u8], algorithm: DigestAlgorithm) -> ContentId {
    let digest = match algorithm {
        DigestAlgorithm::Sha256 => Sha256::digest(bytes).to_vec(),
        DigestAlgorithm::Sha512 => Sha512::digest(bytes).to_vec(),
    };
    // 5 digest bytes encode to exactly 8 base-32 characters without padding.
    let mut encoded = BASE32.encode(&digest[..5]);
    encoded.truncate(ID_LEN);
    ContentId(encoded)
}
