// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubelet bootstrap tokens in the shoot.
//!
//! Tokens live as `bootstrap-token-<id>` secrets in the shoot's `kube-system`
//! namespace. The id is derived from the current date, so one token is issued
//! per day and reused while it has not expired.

use crate::constants::{
    BOOTSTRAP_TOKEN_GROUP, BOOTSTRAP_TOKEN_SECRET_PREFIX, BOOTSTRAP_TOKEN_SECRET_TYPE,
    NAMESPACE_KUBE_SYSTEM,
};
use crate::reconcilers::resources::create_or_update;
use crate::secrets::checksum::sha256_hex;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::{Api, Client};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

const KEY_TOKEN_ID: &str = "token-id";
const KEY_TOKEN_SECRET: &str = "token-secret";
const KEY_EXPIRATION: &str = "expiration";
const KEY_DESCRIPTION: &str = "description";
const KEY_USAGE_AUTHENTICATION: &str = "usage-bootstrap-authentication";
const KEY_USAGE_SIGNING: &str = "usage-bootstrap-signing";
const KEY_AUTH_EXTRA_GROUPS: &str = "auth-extra-groups";

/// Length of a bootstrap token id
const TOKEN_ID_LENGTH: usize = 6;

/// Length of a bootstrap token secret
const TOKEN_SECRET_LENGTH: usize = 16;

/// Characters allowed in bootstrap token ids and secrets
const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Token id for `date`: the first six hex characters of its SHA-256.
#[must_use]
pub fn token_id_for_date(date: &str) -> String {
    sha256_hex(date.as_bytes())[..TOKEN_ID_LENGTH].to_string()
}

fn random_token_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_SECRET_LENGTH)
        .map(|_| char::from(TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())]))
        .collect()
}

/// The full bearer token `<id>.<secret>` stored in `secret`, if it has not expired.
#[must_use]
pub fn valid_token(secret: &Secret, now: DateTime<Utc>) -> Option<String> {
    let data = secret.data.as_ref()?;
    let value = |key: &str| {
        data.get(key)
            .and_then(|v| String::from_utf8(v.0.clone()).ok())
    };

    let expiration = DateTime::parse_from_rfc3339(&value(KEY_EXPIRATION)?).ok()?;
    if expiration.with_timezone(&Utc) <= now {
        return None;
    }

    Some(format!("{}.{}", value(KEY_TOKEN_ID)?, value(KEY_TOKEN_SECRET)?))
}

/// Secret data of a bootstrap token.
#[must_use]
pub fn bootstrap_token_data(
    token_id: &str,
    token_secret: &str,
    description: &str,
    expiration: DateTime<Utc>,
) -> BTreeMap<String, ByteString> {
    [
        (KEY_TOKEN_ID, token_id.to_string()),
        (KEY_TOKEN_SECRET, token_secret.to_string()),
        (KEY_DESCRIPTION, description.to_string()),
        (KEY_EXPIRATION, expiration.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
        (KEY_USAGE_AUTHENTICATION, "true".to_string()),
        (KEY_USAGE_SIGNING, "true".to_string()),
        (KEY_AUTH_EXTRA_GROUPS, BOOTSTRAP_TOKEN_GROUP.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), ByteString(v.into_bytes())))
    .collect()
}

/// Return a valid bootstrap token for today, creating or renewing it as needed.
///
/// # Errors
///
/// Returns an error if the secret cannot be read or written.
pub async fn compute_bootstrap_token(
    shoot_client: &Client,
    description: &str,
    validity: Duration,
) -> Result<String> {
    let now = Utc::now();
    let token_id = token_id_for_date(&now.format("%Y-%m-%d").to_string());
    let name = format!("{BOOTSTRAP_TOKEN_SECRET_PREFIX}{token_id}");
    let api: Api<Secret> = Api::namespaced(shoot_client.clone(), NAMESPACE_KUBE_SYSTEM);

    if let Some(existing) = api
        .get_opt(&name)
        .await
        .with_context(|| format!("failed to read bootstrap token {name}"))?
    {
        if let Some(token) = valid_token(&existing, now) {
            debug!(secret = %name, "Reusing bootstrap token");
            return Ok(token);
        }
    }

    let token_secret = random_token_secret();
    let data = bootstrap_token_data(&token_id, &token_secret, description, now + validity);

    create_or_update(&api, &name, |existing| {
        let mut secret = existing.unwrap_or_else(|| Secret {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(NAMESPACE_KUBE_SYSTEM.to_string()),
                ..ObjectMeta::default()
            },
            type_: Some(BOOTSTRAP_TOKEN_SECRET_TYPE.to_string()),
            ..Secret::default()
        });
        secret.data = Some(data);
        secret
    })
    .await?;

    info!(secret = %name, "Issued bootstrap token");
    Ok(format!("{token_id}.{token_secret}"))
}

#[cfg(test)]
#[path = "bootstrap_token_tests.rs"]
mod bootstrap_token_tests;
