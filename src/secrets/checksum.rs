// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Content checksums of secret data.
//!
//! The checksum is the SHA-256 of the JSON encoding of the data map: keys in
//! sorted order, values base64 encoded. Charts put it into pod annotations so
//! workloads roll when a mounted secret changes.

use super::{to_byte_strings, SecretData};
use k8s_openapi::ByteString;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Checksum of the data of a Kubernetes `Secret`.
#[must_use]
pub fn compute_secret_checksum(data: &BTreeMap<String, ByteString>) -> String {
    // A string-keyed map of strings always serializes
    let encoded = serde_json::to_vec(data).unwrap_or_default();
    sha256_hex(&encoded)
}

/// Checksum of raw secret data.
#[must_use]
pub fn compute_checksum(data: &SecretData) -> String {
    compute_secret_checksum(&to_byte_strings(data))
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[path = "checksum_tests.rs"]
mod checksum_tests;
