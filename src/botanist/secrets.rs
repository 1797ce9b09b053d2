// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Secret lifecycle of a shoot control plane.
//!
//! A pass runs `load → generate → deploy → sync`. Generation first handles
//! credential rotation, tunnel transitions and basic-auth toggles by deleting
//! the affected secrets from both the ledger and the seed, then lets the
//! secrets manager issue whatever is missing and persists the ledger into the
//! `ShootState` before anything is deployed.

use super::shoot::{api_server_domain, ShootContext};
use super::wanted_secrets::{
    basic_auth_secret_api_server, generate_static_token_config, generate_wanted_secret_configs,
    wanted_certificate_authorities, VPA_SECRETS,
};
use super::Botanist;
use crate::constants::{
    DATA_KEY_CERTIFICATE_CA, DATA_KEY_TOKEN, NAMESPACE_GARDEN, PROJECT_SECRET_SUFFIX_KUBECONFIG,
    PROJECT_SECRET_SUFFIX_LOGGING, PROJECT_SECRET_SUFFIX_MONITORING, SECRET_NAME_BASIC_AUTH,
    SECRET_NAME_CA_CLUSTER, SECRET_NAME_CLOUD_PROVIDER, SECRET_NAME_KONNECTIVITY_SERVER,
    SECRET_NAME_KONNECTIVITY_SERVER_KUBECONFIG, SECRET_NAME_KUBECFG,
    SECRET_NAME_LOGGING_INGRESS_USERS, SECRET_NAME_MONITORING_INGRESS_USERS,
    SECRET_NAME_SSH_KEYPAIR, SECRET_NAME_STATIC_TOKEN, SECRET_NAME_VPN_SEED,
    SECRET_NAME_VPN_SEED_TLS_AUTH, SECRET_NAME_VPN_SHOOT, USER_KUBE_APISERVER_HEALTH_CHECK,
};
use crate::crd::{Shoot, ShootState, ShootStateSpec};
use crate::errors::SecretsError;
use crate::flow::{self, Task};
use crate::labels::{
    CHECKSUM_DATA, GARDENER_OPERATION, GARDEN_ROLE, ROLE_CONTROL_PLANE_WILDCARD_CERT,
    SHOOT_OPERATION_DEPRECATED, URL,
};
use crate::metrics;
use crate::reconcilers::list_secrets;
use crate::reconcilers::resources::{create_or_update, delete_all_ignore_not_found, delete_ignore_not_found};
use crate::reconcilers::retry::{retry_on_conflict, ConflictBackoff};
use crate::secrets::checksum::compute_secret_checksum;
use crate::secrets::config::SecretConfig;
use crate::secrets::credentials::{BasicAuth, StaticToken};
use crate::secrets::ledger::GardenerResourceDataList;
use crate::secrets::manager::SecretsManager;
use anyhow::{bail, Context, Result};
use futures::FutureExt;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use kube::api::PostParams;
use kube::{Api, Resource, ResourceExt};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Type of the secrets copied into seed and project namespaces
const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// A secret copied from the seed namespace into the shoot's project namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectSecret {
    /// Name of the deployed secret in the seed namespace
    pub source: &'static str,
    /// Suffix of the target name, `<shoot>.<suffix>`
    pub suffix: &'static str,
    /// Value of the `url` annotation, if any
    pub url: Option<String>,
}

/// Secrets of the tunnel family that is not configured.
#[must_use]
pub fn tunnel_secrets_to_cleanup(konnectivity_tunnel_enabled: bool) -> Vec<&'static str> {
    if konnectivity_tunnel_enabled {
        vec![SECRET_NAME_VPN_SEED, SECRET_NAME_VPN_SEED_TLS_AUTH, SECRET_NAME_VPN_SHOOT]
    } else {
        vec![
            SECRET_NAME_KONNECTIVITY_SERVER_KUBECONFIG,
            SECRET_NAME_KONNECTIVITY_SERVER,
        ]
    }
}

/// Basic auth was switched on or off since the ledger was written.
#[must_use]
pub fn basic_auth_transition(wants_basic_auth: bool, ledger_has_basic_auth: bool) -> bool {
    wants_basic_auth != ledger_has_basic_auth
}

/// `ledger` without the entries in `names`, or `None` if none of them was present.
#[must_use]
pub fn ledger_without(
    ledger: &GardenerResourceDataList,
    names: &[&str],
) -> Option<GardenerResourceDataList> {
    let mut remaining = ledger.clone();
    let mut removed = false;
    for name in names {
        removed |= remaining.delete(name);
    }
    removed.then_some(remaining)
}

/// Listed names that are not wanted, in listing order.
#[must_use]
pub fn stale_secret_names<'a, I>(listed: I, wanted: &BTreeSet<String>) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    listed
        .into_iter()
        .filter(|name| !wanted.contains(*name))
        .cloned()
        .collect()
}

/// `k1=v1,k2=v2` selector for `labels`.
#[must_use]
pub fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// End-user credentials copied into the project namespace.
#[must_use]
pub fn project_secrets(shoot: &ShootContext) -> Vec<ProjectSecret> {
    let mut secrets = vec![
        ProjectSecret {
            source: SECRET_NAME_KUBECFG,
            suffix: PROJECT_SECRET_SUFFIX_KUBECONFIG,
            url: Some(format!(
                "https://{}",
                api_server_domain(
                    shoot
                        .external_cluster_domain
                        .as_deref()
                        .unwrap_or(&shoot.internal_cluster_domain)
                )
            )),
        },
        ProjectSecret {
            source: SECRET_NAME_SSH_KEYPAIR,
            suffix: SECRET_NAME_SSH_KEYPAIR,
            url: None,
        },
        ProjectSecret {
            source: SECRET_NAME_MONITORING_INGRESS_USERS,
            suffix: PROJECT_SECRET_SUFFIX_MONITORING,
            url: Some(format!("https://{}", shoot.grafana_users_host())),
        },
    ];

    if shoot.logging_enabled {
        secrets.push(ProjectSecret {
            source: SECRET_NAME_LOGGING_INGRESS_USERS,
            suffix: PROJECT_SECRET_SUFFIX_LOGGING,
            url: Some(format!("https://{}", shoot.kibana_host())),
        });
    }

    secrets
}

/// Secrets manager for `shoot` starting from `ledger`.
fn new_secrets_manager(
    shoot: &ShootContext,
    ledger: GardenerResourceDataList,
) -> SecretsManager<
    impl Fn(Option<&BasicAuth>, Option<&StaticToken>) -> Result<Vec<SecretConfig>, SecretsError> + '_,
> {
    let manager = SecretsManager::new(
        ledger,
        generate_static_token_config(shoot),
        wanted_certificate_authorities(),
        move |basic_auth: Option<&BasicAuth>,
              static_token: Option<&StaticToken>|
              -> Result<Vec<SecretConfig>, SecretsError> {
            generate_wanted_secret_configs(shoot, basic_auth, static_token)
        },
    );

    if shoot.wants_basic_authentication() {
        manager.with_api_server_basic_auth_config(basic_auth_secret_api_server())
    } else {
        manager
    }
}

fn opaque_secret(name: &str, namespace: &str, data: BTreeMap<String, ByteString>) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        type_: Some(SECRET_TYPE_OPAQUE.to_string()),
        data: Some(data),
        ..Secret::default()
    }
}

/// `target` carrying the data of `source`, owned by the shoot. The `url`
/// annotation replaces any annotations `target` had.
fn synced_project_secret(
    mut target: Secret,
    project_secret: &ProjectSecret,
    source: &Secret,
    owner: OwnerReference,
) -> Secret {
    target.metadata.owner_references = Some(vec![owner]);
    target.metadata.annotations = project_secret
        .url
        .as_ref()
        .map(|url| BTreeMap::from([(URL.to_string(), url.clone())]));
    target.type_ = Some(SECRET_TYPE_OPAQUE.to_string());
    target.data = source.data.clone();
    target
}

impl Botanist {
    /// Import live seed secrets the ledger does not know yet and persist the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if listing, importing or persisting fails.
    pub async fn load_existing_secrets_into_shoot_state(&mut self) -> Result<()> {
        let existing = list_secrets(&self.seed_client, &self.shoot.seed_namespace, None).await?;

        let ledger = {
            let mut manager =
                new_secrets_manager(&self.shoot, self.ledger.clone()).with_existing_secrets(existing);
            let imported = manager.load().context("failed to import existing secrets")?;
            info!(
                namespace = %self.shoot.seed_namespace,
                imported = imported,
                "Imported existing secrets into shoot state"
            );
            manager.gardener_resource_data_list
        };

        self.persist_shoot_state(ledger).await
    }

    /// Rotate, clean up and generate secret material, then persist the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if a deletion, the generation or persisting fails.
    pub async fn generate_and_save_secrets(&mut self) -> Result<()> {
        if self.shoot.wants_kubeconfig_rotation() {
            self.rotate_kubeconfig_secrets().await?;
        }

        if !self.shoot.is_deleting() {
            let stale = tunnel_secrets_to_cleanup(self.shoot.konnectivity_tunnel_enabled);
            self.delete_secrets(&stale).await?;
        }

        if basic_auth_transition(
            self.shoot.wants_basic_authentication(),
            self.ledger.contains(SECRET_NAME_BASIC_AUTH),
        ) {
            info!(
                shoot = %self.shoot.name(),
                wants_basic_auth = self.shoot.wants_basic_authentication(),
                "Basic authentication changed, dropping credentials"
            );
            self.delete_secrets(&[SECRET_NAME_BASIC_AUTH, SECRET_NAME_KUBECFG])
                .await?;
        }

        let existing = list_secrets(&self.seed_client, &self.shoot.seed_namespace, None).await?;
        let ledger = {
            let mut manager =
                new_secrets_manager(&self.shoot, self.ledger.clone()).with_existing_secrets(existing);
            manager.generate().context("failed to generate secrets")?;
            debug!(
                secrets = manager.generated_secret_names().len(),
                "Secret material generated"
            );
            manager.gardener_resource_data_list
        };

        self.persist_shoot_state(ledger).await
    }

    /// Write `ledger` into the shoot's `ShootState` and adopt it.
    ///
    /// # Errors
    ///
    /// Returns an error if the `ShootState` cannot be written.
    pub async fn persist_shoot_state(&mut self, ledger: GardenerResourceDataList) -> Result<()> {
        let namespace = self.shoot.project_namespace();
        let name = self.shoot.name();
        let api: Api<ShootState> = Api::namespaced(self.garden_client.clone(), &namespace);
        let entries = ledger.as_slice().to_vec();

        create_or_update(&api, &name, |existing| {
            let mut state =
                existing.unwrap_or_else(|| ShootState::new(&name, ShootStateSpec::default()));
            state.metadata.namespace = Some(namespace.clone());
            state.spec.gardener = entries;
            state
        })
        .await
        .with_context(|| format!("failed to persist shoot state of {name}"))?;

        self.ledger = ledger;
        Ok(())
    }

    /// Drop the kubeconfig credentials and clear the rotation request.
    ///
    /// # Errors
    ///
    /// Returns an error if a deletion or the shoot update fails.
    pub async fn rotate_kubeconfig_secrets(&mut self) -> Result<()> {
        info!(shoot = %self.shoot.name(), "Rotating kubeconfig credentials");
        self.delete_secrets(&[SECRET_NAME_STATIC_TOKEN, SECRET_NAME_BASIC_AUTH, SECRET_NAME_KUBECFG])
            .await?;

        let api: Api<Shoot> =
            Api::namespaced(self.garden_client.clone(), &self.shoot.project_namespace());
        let api = &api;
        let name = self.shoot.name();
        let name = name.as_str();

        let updated = retry_on_conflict(
            &ConflictBackoff::default(),
            "remove shoot operation annotation",
            move || async move {
                let mut shoot = api.get(name).await?;
                if let Some(annotations) = shoot.metadata.annotations.as_mut() {
                    annotations.remove(GARDENER_OPERATION);
                    annotations.remove(SHOOT_OPERATION_DEPRECATED);
                }
                api.replace(name, &PostParams::default(), &shoot).await
            },
        )
        .await?;

        self.shoot.info = updated;
        Ok(())
    }

    /// Remove `names` from the ledger and the seed namespace.
    ///
    /// The ledger is persisted right away so removed material cannot come back
    /// from the `ShootState` if a later step fails.
    async fn delete_secrets(&mut self, names: &[&str]) -> Result<()> {
        let api: Api<Secret> = Api::namespaced(self.seed_client.clone(), &self.shoot.seed_namespace);
        delete_all_ignore_not_found(&api, names).await?;

        if let Some(ledger) = ledger_without(&self.ledger, names) {
            debug!(secrets = ?names, "Removed secrets from shoot state");
            self.persist_shoot_state(ledger).await?;
        }
        Ok(())
    }

    /// Deploy every generated secret into the seed namespace and fill the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if generation or any write fails, or if the seed has
    /// more than one wildcard control-plane certificate.
    pub async fn deploy_secrets(&mut self) -> Result<()> {
        let namespace = self.shoot.seed_namespace.clone();
        let existing = list_secrets(&self.seed_client, &namespace, None).await?;

        let (mut deployed, health_check_token, vpa_secrets) = {
            let mut manager =
                new_secrets_manager(&self.shoot, self.ledger.clone()).with_existing_secrets(existing);
            manager.generate().context("failed to generate secrets")?;
            manager.deploy(&self.seed_client, &namespace).await?;

            let static_token = manager
                .static_token
                .as_ref()
                .context("static token was not generated")?;
            let health_check_token = static_token
                .get_token_for_username(USER_KUBE_APISERVER_HEALTH_CHECK)?
                .token
                .clone();

            let mut vpa_secrets = Vec::new();
            if self.shoot.wants_vertical_pod_autoscaler {
                let ca = manager
                    .certificate_authorities
                    .get(SECRET_NAME_CA_CLUSTER)
                    .with_context(|| format!("certificate authority {SECRET_NAME_CA_CLUSTER} is missing"))?;
                for (secret_name, username) in VPA_SECRETS {
                    let token = static_token.get_token_for_username(username)?;
                    let data = BTreeMap::from([
                        (
                            DATA_KEY_TOKEN.to_string(),
                            ByteString(token.token.clone().into_bytes()),
                        ),
                        (
                            DATA_KEY_CERTIFICATE_CA.to_string(),
                            ByteString(ca.certificate_pem.clone().into_bytes()),
                        ),
                    ]);
                    vpa_secrets.push(opaque_secret(secret_name, &namespace, data));
                }
            }

            (manager.deployed_secrets, health_check_token, vpa_secrets)
        };
        self.api_server_health_check_token = Some(health_check_token);

        let api: Api<Secret> = Api::namespaced(self.seed_client.clone(), &namespace);
        for desired in vpa_secrets {
            let name = desired.name_any();
            let (secret, _) = create_or_update(&api, &name, |existing| {
                let mut secret = existing.unwrap_or_else(|| desired.clone());
                secret.data = desired.data.clone();
                secret
            })
            .await?;
            deployed.insert(name, secret);
        }

        let count = deployed.len();
        self.cache.record_deployed(deployed).await;
        metrics::record_secrets_deployed(&namespace, count);

        self.deploy_control_plane_wildcard_cert().await
    }

    /// Copy the seed's wildcard control-plane certificate, if any.
    async fn deploy_control_plane_wildcard_cert(&mut self) -> Result<()> {
        let selector = format!("{GARDEN_ROLE}={ROLE_CONTROL_PLANE_WILDCARD_CERT}");
        let certs = list_secrets(&self.seed_client, NAMESPACE_GARDEN, Some(&selector)).await?;

        if certs.len() > 1 {
            bail!(
                "only one wildcard control-plane certificate may exist in namespace {NAMESPACE_GARDEN}, found {}",
                certs.len()
            );
        }
        let Some((name, source)) = certs.into_iter().next() else {
            debug!("No wildcard control-plane certificate in the seed");
            return Ok(());
        };

        let namespace = self.shoot.seed_namespace.clone();
        let api: Api<Secret> = Api::namespaced(self.seed_client.clone(), &namespace);
        let (secret, _) = create_or_update(&api, &name, |existing| {
            let mut secret = existing.unwrap_or_else(|| Secret {
                metadata: ObjectMeta {
                    name: Some(name.clone()),
                    namespace: Some(namespace.clone()),
                    ..ObjectMeta::default()
                },
                ..Secret::default()
            });
            secret.type_ = source.type_.clone();
            secret.data = source.data.clone();
            secret
        })
        .await?;

        info!(secret = %name, namespace = %namespace, "Copied wildcard control-plane certificate");
        self.control_plane_wildcard_cert = Some(secret);
        Ok(())
    }

    /// Write the shoot's infrastructure credentials into the seed namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret cannot be written.
    pub async fn deploy_cloud_provider_secret(&mut self) -> Result<()> {
        let Some(source) = self.shoot.cloud_provider_secret.clone() else {
            warn!(shoot = %self.shoot.name(), "Shoot has no cloud provider secret, skipping");
            return Ok(());
        };

        let data = source.data.unwrap_or_default();
        let checksum = compute_secret_checksum(&data);
        let namespace = self.shoot.seed_namespace.clone();
        let api: Api<Secret> = Api::namespaced(self.seed_client.clone(), &namespace);

        let (secret, result) = create_or_update(&api, SECRET_NAME_CLOUD_PROVIDER, |existing| {
            let mut secret = existing.unwrap_or_else(|| {
                opaque_secret(SECRET_NAME_CLOUD_PROVIDER, &namespace, BTreeMap::new())
            });
            secret
                .metadata
                .annotations
                .get_or_insert_with(BTreeMap::new)
                .insert(CHECKSUM_DATA.to_string(), checksum.clone());
            secret.data = Some(data);
            secret
        })
        .await?;

        debug!(namespace = %namespace, result = ?result, "Cloud provider secret reconciled");
        self.cache
            .insert(SECRET_NAME_CLOUD_PROVIDER, secret, checksum)
            .await;
        Ok(())
    }

    /// Copy kubeconfig, SSH key and ingress credentials into the project namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if a source secret was not deployed or a write fails.
    pub async fn sync_shoot_credentials_to_garden(&self) -> Result<()> {
        let namespace = self.shoot.project_namespace();
        let shoot_name = self.shoot.name();
        let owner = self
            .shoot
            .info
            .controller_owner_ref(&())
            .context("shoot has no name or uid to reference")?;
        let api: Api<Secret> = Api::namespaced(self.garden_client.clone(), &namespace);

        for project_secret in project_secrets(&self.shoot) {
            let source = self
                .cache
                .secret(project_secret.source)
                .await
                .with_context(|| format!("secret {} has not been deployed", project_secret.source))?;
            let name = format!("{shoot_name}.{}", project_secret.suffix);

            create_or_update(&api, &name, |existing| {
                let secret = existing
                    .unwrap_or_else(|| opaque_secret(&name, &namespace, BTreeMap::new()));
                synced_project_secret(secret, &project_secret, &source, owner.clone())
            })
            .await
            .with_context(|| format!("failed to sync {name} to the garden"))?;
        }

        info!(shoot = %shoot_name, namespace = %namespace, "Synced shoot credentials to the garden");
        Ok(())
    }

    /// Delete the seed secrets matching `labels` whose name is not in `wanted`.
    ///
    /// Returns how many stale secrets were found.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails or any deletion fails.
    pub async fn delete_stale_secrets_matching_labels(
        &self,
        labels: &BTreeMap<String, String>,
        wanted: &BTreeSet<String>,
    ) -> Result<usize> {
        let namespace = &self.shoot.seed_namespace;
        let selector = label_selector(labels);
        let listed = list_secrets(&self.seed_client, namespace, Some(&selector)).await?;
        let stale = stale_secret_names(listed.keys(), wanted);
        if stale.is_empty() {
            return Ok(0);
        }

        let api: Api<Secret> = Api::namespaced(self.seed_client.clone(), namespace);
        let api = &api;
        let tasks: Vec<Task<'_>> = stale
            .iter()
            .map(|name| {
                async move { delete_ignore_not_found(api, name).await.map(|_| ()) }.boxed()
            })
            .collect();

        flow::parallel(&self.cancel, "delete-stale-secrets", tasks).await?;

        info!(namespace = %namespace, selector = %selector, deleted = stale.len(), "Deleted stale secrets");
        metrics::record_stale_secrets_deleted(namespace, stale.len());
        Ok(stale.len())
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod secrets_tests;
