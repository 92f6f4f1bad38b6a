// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Canonical JSON hashing for resource specs.
//!
//! `spec_hash` is used throughout the store and dispatcher as a cheap,
//! deterministic fingerprint of a resource's `spec`. Two specs that are
//! structurally equal but differ in key order must hash identically, so
//! canonicalization sorts object keys recursively before hashing.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Render a `serde_json::Value` as canonical JSON: object keys sorted
/// recursively, arrays preserved in order.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut buf = String::new();
    write_canonical(value, &mut buf);
    buf
}

fn write_canonical(value: &Value, buf: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            buf.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                buf.push_str(&serde_json::to_string(key).expect("string keys always serialize"));
                buf.push(':');
                write_canonical(&map[*key], buf);
            }
            buf.push('}');
        }
        Value::Array(items) => {
            buf.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                write_canonical(item, buf);
            }
            buf.push(']');
        }
        other => buf.push_str(&other.to_string()),
    }
}

/// SHA-256 hex digest of the canonical JSON form of `spec`.
#[must_use]
pub fn spec_hash(spec: &Value) -> String {
    let canonical = canonical_json(spec);
    let digest = Sha256::digest(canonical.as_bytes());
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
#[path = "hash_tests.rs"]
mod hash_tests;
