// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Secret material for shoot control planes.
//!
//! This module turns [`config::SecretConfig`] descriptions into concrete
//! secret data and keeps track of what was issued:
//!
//! - [`config`] - generation parameters, one variant per kind of secret
//! - [`certificate`], [`keys`], [`credentials`], [`kubeconfig`] - generators
//! - [`material`] - dispatch from a config to its secret data
//! - [`ledger`] - the persisted record of issued material
//! - [`checksum`] - content checksums used in pod annotations
//! - [`manager`] - the [`manager::SecretsManager`] tying it all together

pub mod certificate;
pub mod checksum;
pub mod config;
pub mod credentials;
pub mod keys;
pub mod kubeconfig;
pub mod ledger;
pub mod manager;
pub mod material;

use k8s_openapi::ByteString;
use std::collections::BTreeMap;

/// Raw secret data, key to bytes.
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Convert secret data into the form stored on a Kubernetes `Secret`.
#[must_use]
pub fn to_byte_strings(data: &SecretData) -> BTreeMap<String, ByteString> {
    data.iter()
        .map(|(k, v)| (k.clone(), ByteString(v.clone())))
        .collect()
}

/// Convert the data of a Kubernetes `Secret` back to raw bytes.
#[must_use]
pub fn from_byte_strings(data: &BTreeMap<String, ByteString>) -> SecretData {
    data.iter().map(|(k, v)| (k.clone(), v.0.clone())).collect()
}
