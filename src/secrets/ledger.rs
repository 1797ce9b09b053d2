// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The ledger of issued secret material.
//!
//! The ledger lives in `ShootState.spec.gardener` as a list of
//! `{name, type, data}` entries. `data` holds the base64-encoded secret data
//! plus the fingerprint of the configuration the material was generated from:
//!
//! ```json
//! {"secretData": {"ca.crt": "LS0t..."}, "configChecksum": "9f2c..."}
//! ```
//!
//! Entries imported from live secrets carry no fingerprint; the secrets
//! manager adopts them as-is on the next generation.

use super::SecretData;
use crate::crd::GardenerResourceData;
use crate::errors::SecretsError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ledger type of entries imported from live secrets
pub const KIND_IMPORTED: &str = "imported";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryPayload {
    #[serde(default)]
    secret_data: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config_checksum: Option<String>,
}

/// A decoded ledger entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub name: String,
    pub kind: String,
    pub data: SecretData,
    /// Fingerprint of the generating configuration; `None` for imported entries
    pub config_checksum: Option<String>,
}

impl LedgerEntry {
    #[must_use]
    pub fn new(name: &str, kind: &str, data: SecretData, config_checksum: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            data,
            config_checksum,
        }
    }

    /// Encode into the persisted form.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Serialization`] if the payload cannot be encoded.
    pub fn encode(&self) -> Result<GardenerResourceData, SecretsError> {
        let payload = EntryPayload {
            secret_data: self
                .data
                .iter()
                .map(|(k, v)| (k.clone(), STANDARD.encode(v)))
                .collect(),
            config_checksum: self.config_checksum.clone(),
        };

        let data = serde_json::to_value(&payload).map_err(|e| SecretsError::Serialization {
            secret: self.name.clone(),
            reason: e.to_string(),
        })?;

        Ok(GardenerResourceData {
            name: self.name.clone(),
            type_: self.kind.clone(),
            data,
        })
    }

    /// Decode a persisted entry.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::MalformedLedgerEntry`] if the payload is not
    /// the expected shape or a value is not valid base64.
    pub fn decode(resource: &GardenerResourceData) -> Result<Self, SecretsError> {
        let malformed = |reason: String| SecretsError::MalformedLedgerEntry {
            name: resource.name.clone(),
            reason,
        };

        let payload: EntryPayload =
            serde_json::from_value(resource.data.clone()).map_err(|e| malformed(e.to_string()))?;

        let data = payload
            .secret_data
            .into_iter()
            .map(|(k, v)| {
                STANDARD
                    .decode(&v)
                    .map(|bytes| (k.clone(), bytes))
                    .map_err(|e| malformed(format!("{k} is not base64: {e}")))
            })
            .collect::<Result<SecretData, _>>()?;

        Ok(Self {
            name: resource.name.clone(),
            kind: resource.type_.clone(),
            data,
            config_checksum: payload.config_checksum,
        })
    }
}

/// Ordered list of ledger entries, unique by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GardenerResourceDataList(Vec<GardenerResourceData>);

impl GardenerResourceDataList {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GardenerResourceData> {
        self.0.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Decode the entry `name`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be decoded.
    pub fn entry(&self, name: &str) -> Result<Option<LedgerEntry>, SecretsError> {
        self.get(name).map(LedgerEntry::decode).transpose()
    }

    /// Insert or replace an entry, keeping the position of a replaced one.
    pub fn upsert(&mut self, data: GardenerResourceData) {
        match self.0.iter_mut().find(|e| e.name == data.name) {
            Some(existing) => *existing = data,
            None => self.0.push(data),
        }
    }

    /// Encode and upsert `entry`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be encoded.
    pub fn upsert_entry(&mut self, entry: &LedgerEntry) -> Result<(), SecretsError> {
        self.upsert(entry.encode()?);
        Ok(())
    }

    /// Remove the entry `name`. Returns `true` if it existed.
    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|e| e.name != name);
        self.0.len() != before
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[GardenerResourceData] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<GardenerResourceData> {
        self.0
    }
}

impl From<Vec<GardenerResourceData>> for GardenerResourceDataList {
    fn from(entries: Vec<GardenerResourceData>) -> Self {
        let mut list = Self::default();
        for entry in entries {
            list.upsert(entry);
        }
        list
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod ledger_tests;
