// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn genesis_is_sixty_four_zeros() {
    assert_eq!(GENESIS_SHA256.len(), 64);
    assert!(GENESIS_SHA256.bytes().all(|b| b == b'0'));
    assert!(is_sha256_hex(GENESIS_SHA256));
}

#[test]
fn sha256_hex_matches_known_vector() {
    // SHA-256("abc"), a standard FIPS 180-2 test vector
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn sha256_hex_of_empty_input() {
    assert_eq!(
        sha256_hex(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn hex_shape_validation_rejects_bad_digests() {
    assert!(is_sha256_hex(&sha256_hex(b"x")));
    assert!(!is_sha256_hex(""));
    assert!(!is_sha256_hex(&"a".repeat(63)));
    assert!(!is_sha256_hex(&"a".repeat(65)));
    // Uppercase hex is not a valid stored digest
    assert!(!is_sha256_hex(&"A".repeat(64)));
    assert!(!is_sha256_hex(&"g".repeat(64)));
}

#[test]
fn chain_hash_is_sha256_of_concatenated_hex_text() {
    let audit = sha256_hex(b"audit");
    let delta = sha256_hex(b"delta");

    let chained = chain_commit_sha256(GENESIS_SHA256, &audit, &delta);

    let mut concat = String::new();
    concat.push_str(GENESIS_SHA256);
    concat.push_str(&audit);
    concat.push_str(&delta);
    assert_eq!(chained, sha256_hex(concat.as_bytes()));
}

#[test]
fn chain_hash_is_deterministic_and_input_sensitive() {
    let audit = sha256_hex(b"a");
    let delta = sha256_hex(b"d");

    let first = chain_commit_sha256(GENESIS_SHA256, &audit, &delta);
    let second = chain_commit_sha256(GENESIS_SHA256, &audit, &delta);
    assert_eq!(first, second);
    assert!(is_sha256_hex(&first));

    let other = chain_commit_sha256(&first, &audit, &delta);
    assert_ne!(first, other);
}
