// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SHA-256 hash-chain primitives for white commits
//!
//! The chain hash is computed over the UTF-8 *hex text* of the three
//! input digests, not their raw 32-byte forms. Existing chains depend on
//! this exact byte layout, so it must never change.

use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Placeholder `prev_commit_sha256` for the first commit in a session.
pub const GENESIS_SHA256: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Length of a rendered SHA-256 digest in hex characters.
pub const SHA256_HEX_LEN: usize = 64;

/// SHA-256 of `bytes`, rendered as 64 lowercase hex characters.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(SHA256_HEX_LEN);
    for byte in digest {
        // Writing to a String cannot fail
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Check that `s` has the shape of a stored digest: exactly 64 lowercase
/// hex characters.
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == SHA256_HEX_LEN
        && s.bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Compute a commit's chain hash from its predecessor's digest and the
/// audit/coverage payload digests.
///
/// The three digests are concatenated as hex text and hashed as UTF-8
/// bytes: `SHA256(prev_hex || audit_hex || delta_hex)`.
pub fn chain_commit_sha256(prev_hex: &str, audit_hex: &str, delta_hex: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev_hex.as_bytes());
    hasher.update(audit_hex.as_bytes());
    hasher.update(delta_hex.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(SHA256_HEX_LEN);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
#[path = "hash_tests.rs"]
mod tests;
