// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic create-or-update and delete helpers for Kubernetes resources.
//!
//! Every object the botanist owns (secrets, managed resources, the shoot
//! state) is written through [`create_or_update`], which fetches the live
//! object, lets the caller mutate it and only talks to the API server again
//! if something actually changed. Deletions go through
//! [`delete_ignore_not_found`] so repeated cleanups stay idempotent.
//!
//! # Example
//!
//! ```rust,no_run
//! use botanist::reconcilers::resources::{create_or_update, delete_ignore_not_found};
//! use k8s_openapi::api::core::v1::Secret;
//! use kube::{Api, Client};
//!
//! # async fn example(client: Client) -> anyhow::Result<()> {
//! let api: Api<Secret> = Api::namespaced(client, "shoot--dev--local");
//!
//! create_or_update(&api, "my-secret", |existing| {
//!     let mut secret = existing.unwrap_or_default();
//!     secret.metadata.name = Some("my-secret".to_string());
//!     secret.string_data = Some([("key".to_string(), "value".to_string())].into());
//!     secret
//! })
//! .await?;
//!
//! delete_ignore_not_found(&api, "old-secret").await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

/// HTTP status of a missing object
const HTTP_NOT_FOUND: u16 = 404;

/// HTTP status of an optimistic-concurrency conflict
const HTTP_CONFLICT: u16 = 409;

/// What [`create_or_update`] did to the object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationResult {
    Created,
    Updated,
    Unchanged,
}

/// `true` if the error is an API "not found" response.
#[must_use]
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(e) if e.code == HTTP_NOT_FOUND)
}

/// `true` if the error is an API conflict response.
#[must_use]
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(e) if e.code == HTTP_CONFLICT)
}

/// Create or update the object `name` through `api`.
///
/// `mutate` receives the live object (or `None` if it does not exist yet) and
/// returns the desired object. The desired object is compared with the live
/// one and written only if they differ. Callers mutating the live object keep
/// its `resourceVersion`, so updates are optimistic-concurrency safe.
///
/// # Errors
///
/// Returns an error if reading, creating or replacing the object fails.
pub async fn create_or_update<T, F>(
    api: &Api<T>,
    name: &str,
    mutate: F,
) -> Result<(T, OperationResult)>
where
    T: Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned,
    F: FnOnce(Option<T>) -> T,
{
    let kind = T::kind(&());
    let existing = api
        .get_opt(name)
        .await
        .with_context(|| format!("failed to read {kind} {name}"))?;

    let Some(current) = existing else {
        debug!(kind = %kind, name = %name, "Object does not exist, creating");
        let desired = mutate(None);
        let created = api
            .create(&PostParams::default(), &desired)
            .await
            .with_context(|| format!("failed to create {kind} {name}"))?;
        info!("Created {} {}", kind, name);
        return Ok((created, OperationResult::Created));
    };

    let desired = mutate(Some(current.clone()));
    if serde_json::to_value(&desired)? == serde_json::to_value(&current)? {
        debug!(kind = %kind, name = %name, "Object is up to date");
        return Ok((current, OperationResult::Unchanged));
    }

    let updated = api
        .replace(name, &PostParams::default(), &desired)
        .await
        .with_context(|| format!("failed to update {kind} {name}"))?;
    info!("Updated {} {}", kind, name);

    Ok((updated, OperationResult::Updated))
}

/// Delete the object `name`, treating "not found" as success.
///
/// Returns `true` if an object was deleted.
///
/// # Errors
///
/// Returns an error for any API failure other than "not found".
pub async fn delete_ignore_not_found<T>(api: &Api<T>, name: &str) -> Result<bool>
where
    T: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned,
{
    let kind = T::kind(&());

    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            info!("Deleted {} {}", kind, name);
            Ok(true)
        }
        Err(e) if is_not_found(&e) => {
            debug!(kind = %kind, name = %name, "Object already gone");
            Ok(false)
        }
        Err(e) => Err(e).with_context(|| format!("failed to delete {kind} {name}")),
    }
}

/// Delete every object in `names`, treating "not found" as success.
///
/// # Errors
///
/// Returns the first deletion error.
pub async fn delete_all_ignore_not_found<T, S>(api: &Api<T>, names: &[S]) -> Result<()>
where
    T: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned,
    S: AsRef<str>,
{
    for name in names {
        delete_ignore_not_found(api, name.as_ref()).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
