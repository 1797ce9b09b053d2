// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deployed secrets and their checksums, shared by the deploy phases and the
//! chart value builders.
//!
//! The cache is never persisted. Each deploy phase writes its results in one
//! exclusive section so readers never observe a half-updated set.

use crate::labels::CHECKSUM_SECRET_PREFIX;
use crate::secrets::checksum::compute_secret_checksum;
use k8s_openapi::api::core::v1::Secret;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Pod annotation key carrying the checksum of secret `name`.
#[must_use]
pub fn checksum_annotation(name: &str) -> String {
    format!("{CHECKSUM_SECRET_PREFIX}{name}")
}

/// Point-in-time copy of the cache contents.
#[derive(Clone, Debug, Default)]
pub struct CacheState {
    pub secrets: BTreeMap<String, Secret>,
    pub checksums: BTreeMap<String, String>,
}

impl CacheState {
    #[must_use]
    pub fn secret(&self, name: &str) -> Option<&Secret> {
        self.secrets.get(name)
    }

    /// Checksum of `name`, or an empty string if it was never deployed.
    #[must_use]
    pub fn checksum(&self, name: &str) -> String {
        self.checksums.get(name).cloned().unwrap_or_default()
    }
}

/// Cloneable handle on the shared cache.
#[derive(Clone, Debug, Default)]
pub struct SecretCache {
    inner: Arc<RwLock<CacheState>>,
}

impl SecretCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch of deployed secrets and recompute their checksums.
    pub async fn record_deployed(&self, secrets: BTreeMap<String, Secret>) {
        let mut state = self.inner.write().await;
        for (name, secret) in secrets {
            let checksum = secret
                .data
                .as_ref()
                .map(compute_secret_checksum)
                .unwrap_or_else(|| compute_secret_checksum(&BTreeMap::new()));
            state.checksums.insert(name.clone(), checksum);
            state.secrets.insert(name, secret);
        }
    }

    /// Record one secret under an explicitly computed checksum.
    pub async fn insert(&self, name: &str, secret: Secret, checksum: String) {
        let mut state = self.inner.write().await;
        state.secrets.insert(name.to_string(), secret);
        state.checksums.insert(name.to_string(), checksum);
    }

    pub async fn secret(&self, name: &str) -> Option<Secret> {
        self.inner.read().await.secrets.get(name).cloned()
    }

    pub async fn checksum(&self, name: &str) -> Option<String> {
        self.inner.read().await.checksums.get(name).cloned()
    }

    pub async fn snapshot(&self) -> CacheState {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod cache_tests;
