// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Runtime configuration read from the environment.
//!
//! Every setting has a default so a bare environment yields a working
//! configuration. Lookups go through a closure so tests never touch the
//! process environment.

use crate::errors::ConfigError;
use std::path::PathBuf;

/// Root directory of the shoot charts
pub const ENV_CHART_PATH: &str = "BOTANIST_CHART_PATH";

/// Path of the image vector file
pub const ENV_IMAGE_VECTOR: &str = "BOTANIST_IMAGE_VECTOR";

/// Comma separated `Name=bool` feature gates
pub const ENV_FEATURE_GATES: &str = "BOTANIST_FEATURE_GATES";

/// Ingress domain of the seed
pub const ENV_SEED_INGRESS_DOMAIN: &str = "BOTANIST_SEED_INGRESS_DOMAIN";

/// Whether the seed manages DNS records for shoots
pub const ENV_SEED_SHOOT_DNS_ENABLED: &str = "BOTANIST_SEED_SHOOT_DNS_ENABLED";

/// Whether the pre-label cloud-config secret is deleted
pub const ENV_LEGACY_SECRET_CLEANUP: &str = "BOTANIST_LEGACY_SECRET_CLEANUP";

/// Helm binary used to render charts
pub const ENV_HELM_BINARY: &str = "BOTANIST_HELM_BINARY";

const DEFAULT_CHART_PATH: &str = "charts";
const DEFAULT_IMAGE_VECTOR: &str = "charts/images.yaml";
const DEFAULT_SEED_INGRESS_DOMAIN: &str = "ingress.seed.example.com";
const DEFAULT_HELM_BINARY: &str = "helm";

/// Feature gates toggling optional secret families.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureGates {
    /// Deploy the logging stack and its credentials
    pub logging: bool,
    /// Use konnectivity instead of OpenVPN for the control-plane tunnel
    pub konnectivity_tunnel: bool,
    /// Reach the kube-apiserver through the seed's SNI endpoint
    pub api_server_sni: bool,
}

impl FeatureGates {
    /// Parse `Logging=true,KonnectivityTunnel=false,APIServerSNI=true` style gate lists.
    ///
    /// # Errors
    ///
    /// Returns an error for entries without `=`, non-boolean values or
    /// unknown gate names.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut gates = Self::default();

        for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidFeatureGate(entry.to_string()))?;
            let enabled = value
                .trim()
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidFeatureGate(entry.to_string()))?;

            match name.trim() {
                "Logging" => gates.logging = enabled,
                "KonnectivityTunnel" => gates.konnectivity_tunnel = enabled,
                "APIServerSNI" => gates.api_server_sni = enabled,
                other => return Err(ConfigError::UnknownFeatureGate(other.to_string())),
            }
        }

        Ok(gates)
    }
}

/// Process-wide botanist settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotanistConfig {
    pub chart_path: PathBuf,
    pub image_vector_path: PathBuf,
    pub feature_gates: FeatureGates,
    pub seed_ingress_domain: String,
    pub seed_shoot_dns_enabled: bool,
    pub legacy_secret_cleanup: bool,
    pub helm_binary: String,
}

impl Default for BotanistConfig {
    fn default() -> Self {
        Self {
            chart_path: PathBuf::from(DEFAULT_CHART_PATH),
            image_vector_path: PathBuf::from(DEFAULT_IMAGE_VECTOR),
            feature_gates: FeatureGates::default(),
            seed_ingress_domain: DEFAULT_SEED_INGRESS_DOMAIN.to_string(),
            seed_shoot_dns_enabled: true,
            legacy_secret_cleanup: true,
            helm_binary: DEFAULT_HELM_BINARY.to_string(),
        }
    }
}

impl BotanistConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a boolean or feature gate variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a boolean or feature gate variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let feature_gates = match lookup(ENV_FEATURE_GATES) {
            Some(raw) => FeatureGates::parse(&raw)?,
            None => defaults.feature_gates,
        };

        Ok(Self {
            chart_path: lookup(ENV_CHART_PATH).map_or(defaults.chart_path, PathBuf::from),
            image_vector_path: lookup(ENV_IMAGE_VECTOR)
                .map_or(defaults.image_vector_path, PathBuf::from),
            feature_gates,
            seed_ingress_domain: lookup(ENV_SEED_INGRESS_DOMAIN)
                .unwrap_or(defaults.seed_ingress_domain),
            seed_shoot_dns_enabled: parse_bool(
                ENV_SEED_SHOOT_DNS_ENABLED,
                lookup(ENV_SEED_SHOOT_DNS_ENABLED),
                defaults.seed_shoot_dns_enabled,
            )?,
            legacy_secret_cleanup: parse_bool(
                ENV_LEGACY_SECRET_CLEANUP,
                lookup(ENV_LEGACY_SECRET_CLEANUP),
                defaults.legacy_secret_cleanup,
            )?,
            helm_binary: lookup(ENV_HELM_BINARY).unwrap_or(defaults.helm_binary),
        })
    }
}

fn parse_bool(name: &str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };

    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name: name.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
