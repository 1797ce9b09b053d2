// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The secrets manager: decides what to generate, keep or reissue.
//!
//! Given the ledger of previously issued material, the live secrets in the
//! seed namespace and a function producing the wanted secret configs, the
//! manager:
//!
//! 1. imports live secrets the ledger does not know about ([`SecretsManager::load`]),
//! 2. ensures every certificate authority exists,
//! 3. reconciles the static token and the API-server basic-auth credentials,
//! 4. asks the wanted-secrets function for the rest, now that tokens are known,
//! 5. keeps or regenerates each wanted secret ([`SecretsManager::generate`]),
//! 6. writes everything to the seed namespace ([`SecretsManager::deploy`]).
//!
//! Long-lived material (CAs, keys, tokens, passwords) is never reissued
//! implicitly. Everything else is regenerated when the fingerprint of its
//! configuration (including the signing CA) changes.
//!
//! # Example
//!
//! ```rust,no_run
//! use botanist::secrets::config::{CertificateConfig, StaticTokenConfig};
//! use botanist::secrets::credentials::{BasicAuth, StaticToken};
//! use botanist::secrets::ledger::GardenerResourceDataList;
//! use botanist::secrets::manager::SecretsManager;
//! use std::collections::BTreeMap;
//!
//! # async fn example(client: kube::Client) -> anyhow::Result<()> {
//! let mut manager = SecretsManager::new(
//!     GardenerResourceDataList::default(),
//!     StaticTokenConfig { name: "static-token".to_string(), tokens: BTreeMap::new() },
//!     vec![CertificateConfig::ca("ca", "kubernetes")],
//!     |_: Option<&BasicAuth>, _: Option<&StaticToken>| Ok(Vec::new()),
//! );
//! manager.load()?;
//! manager.generate()?;
//! manager.deploy(&client, "shoot--dev--local").await?;
//! # Ok(())
//! # }
//! ```

use super::certificate::Certificate;
use super::checksum::sha256_hex;
use super::config::{
    BasicAuthConfig, CertificateConfig, SecretConfig, StaticTokenConfig,
};
use super::credentials::{BasicAuth, StaticToken};
use super::ledger::{GardenerResourceDataList, LedgerEntry, KIND_IMPORTED};
use super::{from_byte_strings, material, to_byte_strings};
use crate::errors::SecretsError;
use crate::reconcilers::resources::create_or_update;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Api, Client};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Type of the secrets the manager writes
const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// Generates, persists and deploys the secrets of one shoot.
pub struct SecretsManager<F> {
    /// Ledger of issued material; persist after [`SecretsManager::generate`]
    pub gardener_resource_data_list: GardenerResourceDataList,
    /// Static token after reconciliation
    pub static_token: Option<StaticToken>,
    /// API-server basic-auth credentials, if configured
    pub api_server_basic_auth: Option<BasicAuth>,
    /// Certificate authorities by name
    pub certificate_authorities: BTreeMap<String, Certificate>,
    /// Secrets written by [`SecretsManager::deploy`], by name
    pub deployed_secrets: BTreeMap<String, Secret>,

    static_token_config: StaticTokenConfig,
    ca_configs: Vec<CertificateConfig>,
    api_server_basic_auth_config: Option<BasicAuthConfig>,
    existing_secrets: BTreeMap<String, Secret>,
    wanted_secrets_fn: F,
    generated: Vec<String>,
}

impl<F> SecretsManager<F>
where
    F: Fn(Option<&BasicAuth>, Option<&StaticToken>) -> Result<Vec<SecretConfig>, SecretsError>,
{
    #[must_use]
    pub fn new(
        gardener_resource_data_list: GardenerResourceDataList,
        static_token_config: StaticTokenConfig,
        ca_configs: Vec<CertificateConfig>,
        wanted_secrets_fn: F,
    ) -> Self {
        Self {
            gardener_resource_data_list,
            static_token: None,
            api_server_basic_auth: None,
            certificate_authorities: BTreeMap::new(),
            deployed_secrets: BTreeMap::new(),
            static_token_config,
            ca_configs,
            api_server_basic_auth_config: None,
            existing_secrets: BTreeMap::new(),
            wanted_secrets_fn,
            generated: Vec::new(),
        }
    }

    /// Live secrets of the seed namespace, by name.
    #[must_use]
    pub fn with_existing_secrets(mut self, existing_secrets: BTreeMap<String, Secret>) -> Self {
        self.existing_secrets = existing_secrets;
        self
    }

    /// Issue API-server basic-auth credentials with `config`.
    #[must_use]
    pub fn with_api_server_basic_auth_config(mut self, config: BasicAuthConfig) -> Self {
        self.api_server_basic_auth_config = Some(config);
        self
    }

    /// Import live secrets missing from the ledger. Returns how many were imported.
    ///
    /// Only secrets the manager issues are imported; any other secret in the
    /// namespace is left out of the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the wanted secrets cannot be listed or an imported
    /// entry cannot be encoded.
    pub fn load(&mut self) -> Result<usize, SecretsError> {
        let known = self.known_secret_names()?;
        let mut imported = 0;

        for (name, secret) in &self.existing_secrets {
            if !known.contains(name.as_str()) || self.gardener_resource_data_list.contains(name) {
                continue;
            }

            let data = secret
                .data
                .as_ref()
                .map(from_byte_strings)
                .unwrap_or_default();
            let entry = LedgerEntry::new(name, self.known_kind(name), data, None);
            self.gardener_resource_data_list.upsert_entry(&entry)?;
            imported += 1;

            debug!(secret = %name, kind = %entry.kind, "Imported live secret into ledger");
        }

        if imported > 0 {
            info!(count = imported, "Imported live secrets missing from the ledger");
        }

        Ok(imported)
    }

    /// Names of every secret this manager can issue.
    fn known_secret_names(&self) -> Result<BTreeSet<String>, SecretsError> {
        let mut names: BTreeSet<String> = self.ca_configs.iter().map(|c| c.name.clone()).collect();
        names.insert(self.static_token_config.name.clone());
        if let Some(config) = &self.api_server_basic_auth_config {
            names.insert(config.name.clone());
        }
        for config in (self.wanted_secrets_fn)(None, None)? {
            names.insert(config.name().to_string());
        }
        Ok(names)
    }

    fn known_kind(&self, name: &str) -> &'static str {
        if self.ca_configs.iter().any(|c| c.name == name) {
            "certificate"
        } else if self.static_token_config.name == name {
            "staticToken"
        } else if self
            .api_server_basic_auth_config
            .as_ref()
            .is_some_and(|c| c.name == name)
        {
            "basicAuth"
        } else {
            KIND_IMPORTED
        }
    }

    /// Generate or keep every secret, updating the ledger in place.
    ///
    /// # Errors
    ///
    /// Returns the first generation failure; the ledger may then hold the
    /// material generated before it.
    pub fn generate(&mut self) -> Result<(), SecretsError> {
        let mut generated = Vec::new();

        for config in &self.ca_configs {
            let entry = ensure_entry(
                &mut self.gardener_resource_data_list,
                &SecretConfig::Certificate(config.clone()),
                None,
            )?;
            let ca = Certificate::ca_from_secret_data(&config.name, &entry.data)?;
            self.certificate_authorities.insert(config.name.clone(), ca);
            generated.push(config.name.clone());
        }

        self.static_token = Some(self.reconcile_static_token()?);
        generated.push(self.static_token_config.name.clone());

        self.api_server_basic_auth = match &self.api_server_basic_auth_config {
            Some(config) => {
                let entry = ensure_entry(
                    &mut self.gardener_resource_data_list,
                    &SecretConfig::BasicAuth(config.clone()),
                    None,
                )?;
                generated.push(config.name.clone());
                Some(BasicAuth::from_secret_data(config, &entry.data)?)
            }
            None => None,
        };

        let wanted = (self.wanted_secrets_fn)(
            self.api_server_basic_auth.as_ref(),
            self.static_token.as_ref(),
        )?;

        for config in &wanted {
            let signer = match config.signing_ca() {
                Some(ca) => Some(self.certificate_authorities.get(ca).ok_or_else(|| {
                    SecretsError::UnresolvedSigningCa {
                        secret: config.name().to_string(),
                        ca: ca.to_string(),
                    }
                })?),
                None => None,
            };

            ensure_entry(&mut self.gardener_resource_data_list, config, signer)?;
            generated.push(config.name().to_string());
        }

        info!(count = generated.len(), "Secrets generated");
        self.generated = generated;

        Ok(())
    }

    fn reconcile_static_token(&mut self) -> Result<StaticToken, SecretsError> {
        let config = &self.static_token_config;
        let fingerprint = config_fingerprint(&SecretConfig::StaticToken(config.clone()), None);

        let (static_token, changed) = match self.gardener_resource_data_list.entry(&config.name)? {
            Some(entry) => {
                let mut static_token = StaticToken::from_secret_data(&config.name, &entry.data)?;
                let changed = static_token.reconcile(config);
                (static_token, changed || entry.config_checksum.is_none())
            }
            None => (StaticToken::generate(config), true),
        };

        if changed {
            debug!(secret = %config.name, "Static token changed");
            self.gardener_resource_data_list.upsert_entry(&LedgerEntry::new(
                &config.name,
                "staticToken",
                static_token.secret_data(),
                Some(fingerprint),
            ))?;
        }

        Ok(static_token)
    }

    /// Names of the secrets produced by the last [`SecretsManager::generate`], in order.
    #[must_use]
    pub fn generated_secret_names(&self) -> &[String] {
        &self.generated
    }

    /// Build the `Secret` objects for every generated secret.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::NotGenerated`] if a name has no ledger entry.
    pub fn desired_secrets(&self, namespace: &str) -> Result<Vec<Secret>, SecretsError> {
        self.generated
            .iter()
            .map(|name| {
                let entry = self
                    .gardener_resource_data_list
                    .entry(name)?
                    .ok_or_else(|| SecretsError::NotGenerated(name.clone()))?;

                Ok(Secret {
                    metadata: ObjectMeta {
                        name: Some(name.clone()),
                        namespace: Some(namespace.to_string()),
                        ..ObjectMeta::default()
                    },
                    type_: Some(SECRET_TYPE_OPAQUE.to_string()),
                    data: Some(to_byte_strings(&entry.data)),
                    ..Secret::default()
                })
            })
            .collect()
    }

    /// Write every generated secret into `namespace`.
    ///
    /// Secrets whose live data already matches are not touched. Data of the
    /// others is fully overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if a secret is missing from the ledger or an API call
    /// fails.
    pub async fn deploy(&mut self, client: &Client, namespace: &str) -> anyhow::Result<()> {
        let api: Api<Secret> = Api::namespaced(client.clone(), namespace);

        for desired in self.desired_secrets(namespace)? {
            let name = desired.metadata.name.clone().unwrap_or_default();

            if let Some(existing) = self.existing_secrets.get(&name) {
                if existing.data == desired.data {
                    debug!(secret = %name, "Secret is up to date");
                    self.deployed_secrets.insert(name, existing.clone());
                    continue;
                }
            }

            let (secret, _) = create_or_update(&api, &name, |existing| {
                let mut secret = existing.unwrap_or_default();
                secret.metadata.name = desired.metadata.name.clone();
                secret.metadata.namespace = desired.metadata.namespace.clone();
                if secret.type_.is_none() {
                    secret.type_ = desired.type_.clone();
                }
                secret.string_data = None;
                secret.data = desired.data.clone();
                secret
            })
            .await?;

            self.deployed_secrets.insert(name, secret);
        }

        info!(
            namespace = %namespace,
            count = self.deployed_secrets.len(),
            "Secrets deployed"
        );

        Ok(())
    }
}

/// Keep the ledger entry for `config` or generate fresh material.
fn ensure_entry(
    ledger: &mut GardenerResourceDataList,
    config: &SecretConfig,
    signer: Option<&Certificate>,
) -> Result<LedgerEntry, SecretsError> {
    let fingerprint = config_fingerprint(config, signer);

    if let Some(mut existing) = ledger.entry(config.name())? {
        let matches = existing
            .config_checksum
            .as_deref()
            .is_none_or(|checksum| checksum == fingerprint);

        if config.is_long_lived() || matches {
            if existing.config_checksum.is_none() || existing.kind != config.kind() {
                existing.kind = config.kind().to_string();
                existing.config_checksum = Some(fingerprint);
                ledger.upsert_entry(&existing)?;
            }
            return Ok(existing);
        }

        info!(secret = %config.name(), "Configuration changed, regenerating secret");
    }

    let data = material::generate(config, signer)?;
    let entry = LedgerEntry::new(config.name(), config.kind(), data, Some(fingerprint));
    ledger.upsert_entry(&entry)?;

    debug!(secret = %config.name(), kind = %config.kind(), "Generated secret");
    Ok(entry)
}

/// SHA-256 of the serialized config and the signing CA certificate.
fn config_fingerprint(config: &SecretConfig, signer: Option<&Certificate>) -> String {
    // Configs hold only strings, integers and addresses, which always serialize
    let mut bytes = serde_json::to_vec(config).unwrap_or_default();
    if let Some(ca) = signer {
        bytes.extend_from_slice(ca.certificate_pem.as_bytes());
    }
    sha256_hex(&bytes)
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod manager_tests;
