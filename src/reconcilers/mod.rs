// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Object-store helpers used by the botanist.
//!
//! # Modules
//!
//! - [`resources`] - generic create-or-update and delete-ignoring-not-found
//! - [`retry`] - bounded retry of conflicting updates
//! - [`managed_resources`] - managed-resource bundles and their secrets
//! - [`bootstrap_token`] - kubelet bootstrap tokens in the shoot
//!
//! # Example
//!
//! ```rust,no_run
//! use botanist::reconcilers::managed_resources::deploy_managed_resource;
//! use botanist::secrets::SecretData;
//! use kube::Client;
//!
//! # async fn example(client: Client, manifests: SecretData) -> anyhow::Result<()> {
//! deploy_managed_resource(&client, "shoot--dev--local", "shoot-core", &manifests, false).await?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap_token;
pub mod managed_resources;
pub mod resources;
pub mod retry;

use k8s_openapi::api::core::v1::Secret;
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};
use std::collections::BTreeMap;

/// List the secrets of `namespace` matching `label_selector`, keyed by name.
///
/// # Errors
///
/// Returns an error if the list call fails.
pub async fn list_secrets(
    client: &Client,
    namespace: &str,
    label_selector: Option<&str>,
) -> anyhow::Result<BTreeMap<String, Secret>> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let params = match label_selector {
        Some(selector) => ListParams::default().labels(selector),
        None => ListParams::default(),
    };

    Ok(api
        .list(&params)
        .await?
        .items
        .into_iter()
        .map(|s| (s.name_any(), s))
        .collect())
}
