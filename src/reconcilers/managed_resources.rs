// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Managed-resource bundles.
//!
//! A bundle is a secret holding rendered manifests plus a
//! [`ManagedResource`] referencing it. The managed-resource controller applies
//! the manifests into the shoot; this module only writes the two objects.

use crate::constants::MANAGED_RESOURCE_SECRET_PREFIX;
use crate::crd::{ManagedResource, ManagedResourceSpec, SecretReference};
use crate::labels::{ORIGIN, ORIGIN_GARDENER, SHOOT_NO_CLEANUP};
use crate::reconcilers::resources::{create_or_update, OperationResult};
use crate::secrets::{to_byte_strings, SecretData};
use anyhow::Result;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::info;

/// Name of the secret backing the bundle `name`.
#[must_use]
pub fn managed_resource_secret_name(name: &str) -> String {
    format!("{MANAGED_RESOURCE_SECRET_PREFIX}{name}")
}

/// Secret holding the manifests of a bundle.
#[must_use]
pub fn build_managed_resource_secret(
    name: &str,
    namespace: &str,
    data: &SecretData,
    labels: BTreeMap<String, String>,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: (!labels.is_empty()).then_some(labels),
            ..ObjectMeta::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(to_byte_strings(data)),
        ..Secret::default()
    }
}

/// A [`ManagedResource`] labelled `origin=gardener` that injects the
/// no-cleanup label into every applied object.
#[must_use]
pub fn build_managed_resource(
    name: &str,
    namespace: &str,
    secret_names: &[String],
    keep_objects: bool,
) -> ManagedResource {
    let mut managed_resource = ManagedResource::new(
        name,
        ManagedResourceSpec {
            secret_refs: secret_names
                .iter()
                .map(|n| SecretReference { name: n.clone() })
                .collect(),
            injected_labels: BTreeMap::from([(SHOOT_NO_CLEANUP.to_string(), "true".to_string())]),
            keep_objects: Some(keep_objects),
            class: None,
        },
    );
    managed_resource.metadata.namespace = Some(namespace.to_string());
    managed_resource.metadata.labels = Some(BTreeMap::from([(
        ORIGIN.to_string(),
        ORIGIN_GARDENER.to_string(),
    )]));
    managed_resource
}

/// Create or update `secret`, merging its labels into the live object.
///
/// # Errors
///
/// Returns an error if the API call fails.
pub async fn create_or_update_secret(client: &Client, secret: &Secret) -> Result<OperationResult> {
    let name = secret.metadata.name.clone().unwrap_or_default();
    let namespace = secret.metadata.namespace.clone().unwrap_or_default();
    let api: Api<Secret> = Api::namespaced(client.clone(), &namespace);

    let (_, result) = create_or_update(&api, &name, |existing| {
        let mut live = existing.unwrap_or_else(|| Secret {
            metadata: secret.metadata.clone(),
            type_: secret.type_.clone(),
            ..Secret::default()
        });
        if let Some(labels) = &secret.metadata.labels {
            live.metadata
                .labels
                .get_or_insert_with(BTreeMap::new)
                .extend(labels.clone());
        }
        if let Some(annotations) = &secret.metadata.annotations {
            live.metadata
                .annotations
                .get_or_insert_with(BTreeMap::new)
                .extend(annotations.clone());
        }
        if let Some(owners) = &secret.metadata.owner_references {
            live.metadata.owner_references = Some(owners.clone());
        }
        live.string_data = None;
        live.data = secret.data.clone();
        live
    })
    .await?;

    Ok(result)
}

/// Create or update a [`ManagedResource`], replacing its spec.
///
/// # Errors
///
/// Returns an error if the API call fails.
pub async fn create_or_update_managed_resource(
    client: &Client,
    managed_resource: &ManagedResource,
) -> Result<OperationResult> {
    let name = managed_resource.metadata.name.clone().unwrap_or_default();
    let namespace = managed_resource.metadata.namespace.clone().unwrap_or_default();
    let api: Api<ManagedResource> = Api::namespaced(client.clone(), &namespace);

    let (_, result) = create_or_update(&api, &name, |existing| {
        let Some(mut live) = existing else {
            return managed_resource.clone();
        };
        if let Some(labels) = &managed_resource.metadata.labels {
            live.metadata
                .labels
                .get_or_insert_with(BTreeMap::new)
                .extend(labels.clone());
        }
        live.spec = managed_resource.spec.clone();
        live
    })
    .await?;

    Ok(result)
}

/// Store `data` as `managedresource-<name>` and reconcile the managed resource `name`.
///
/// # Errors
///
/// Returns an error if either object cannot be written.
pub async fn deploy_managed_resource(
    client: &Client,
    namespace: &str,
    name: &str,
    data: &SecretData,
    keep_objects: bool,
) -> Result<()> {
    let secret_name = managed_resource_secret_name(name);
    let secret = build_managed_resource_secret(&secret_name, namespace, data, BTreeMap::new());
    create_or_update_secret(client, &secret).await?;

    let managed_resource = build_managed_resource(name, namespace, &[secret_name], keep_objects);
    let result = create_or_update_managed_resource(client, &managed_resource).await?;

    info!(
        namespace = %namespace,
        managed_resource = %name,
        result = ?result,
        "Managed resource reconciled"
    );
    Ok(())
}

#[cfg(test)]
#[path = "managed_resources_tests.rs"]
mod managed_resources_tests;
