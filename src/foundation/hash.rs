//! Canonical JSON encoding and SHA-256 helpers.
//!
//! Canonical form: object keys sorted by code point at every depth, no insignificant
//! whitespace, non-ASCII text kept as raw UTF-8. Every declared field participates,
//! including nulls and empty collections, so the digest only changes when content does.

use std::io::Read as _;
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest as _, Sha256};

use crate::foundation::error::{ShotreelError, ShotreelResult};

const FILE_CHUNK_BYTES: usize = 64 * 1024;

/// Encode `doc` as canonical JSON text.
pub fn canonical_json<T: Serialize + ?Sized>(doc: &T) -> ShotreelResult<String> {
    let value = serde_json::to_value(doc)
        .map_err(|e| ShotreelError::serde(format!("failed to canonicalize document: {e}")))?;
    let mut out = String::new();
    write_canonical(&mut out, &value);
    Ok(out)
}

/// SHA-256 (lowercase hex) of the canonical JSON encoding of `doc`.
pub fn canonical_hash<T: Serialize + ?Sized>(doc: &T) -> ShotreelResult<String> {
    Ok(sha256_hex(canonical_json(doc)?.as_bytes()))
}

/// SHA-256 over several documents, each canonically encoded and concatenated in order.
#[derive(Default)]
pub struct CanonicalHasher {
    inner: Sha256,
}

impl CanonicalHasher {
    /// Start an empty digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the canonical encoding of `doc`.
    pub fn update<T: Serialize + ?Sized>(&mut self, doc: &T) -> ShotreelResult<()> {
        self.inner.update(canonical_json(doc)?.as_bytes());
        Ok(())
    }

    /// Finish and return lowercase hex.
    pub fn finish(self) -> String {
        hex_lower(&self.inner.finalize())
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_lower(&Sha256::digest(bytes))
}

/// Lowercase hex SHA-256 of UTF-8 `text`.
pub fn sha256_text(text: &str) -> String {
    sha256_hex(text.as_bytes())
}

/// Lowercase hex SHA-256 of a file, read in fixed-size chunks.
pub fn sha256_file(path: &Path) -> ShotreelResult<String> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("failed to open '{}' for hashing", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; FILE_CHUNK_BYTES];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("failed to read '{}' for hashing", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_lower(&hasher.finalize()))
}

/// Content identifier derived from the manifest and plan hashes.
pub fn derive_output_id(manifest_hash: &str, plan_hash: &str) -> String {
    sha256_text(&format!("{manifest_hash}:{plan_hash}"))
}

fn write_canonical(out: &mut String, v: &Value) {
    match v {
        Value::Object(map) => {
            // Sorted explicitly: serde_json may be built with `preserve_order`.
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort_unstable();
            out.push('{');
            for (i, k) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(k.as_str()).to_string());
                out.push(':');
                write_canonical(out, &map[k]);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/hash.rs"]
mod tests;
