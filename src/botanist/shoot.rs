// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Facts about a shoot derived once per reconciliation.
//!
//! [`ShootContext`] wraps the `Shoot` resource together with the values the
//! botanist computes from it (seed namespace, domains, service addresses)
//! and the seed settings that influence secret generation.

use crate::config::BotanistConfig;
use crate::constants::{
    API_SERVER_DOMAIN_PREFIX, DEPLOYMENT_NAME_KUBE_APISERVER, INGRESS_PREFIX_ALERTMANAGER,
    INGRESS_PREFIX_GRAFANA_OPERATORS, INGRESS_PREFIX_GRAFANA_USERS, INGRESS_PREFIX_KIBANA,
    INGRESS_PREFIX_PROMETHEUS, PROXY_MODE_IPVS,
};
use crate::crd::Shoot;
use crate::errors::ShootError;
use crate::labels::{
    GARDENER_OPERATION, OPERATION_ROTATE_KUBECONFIG_CREDENTIALS, SHOOT_EXPERIMENTAL_ADDON_KYMA,
    SHOOT_OPERATION_DEPRECATED,
};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Offset of the kube-apiserver service inside the service network
const API_SERVER_SERVICE_OFFSET: u128 = 1;

/// Offset of the cluster DNS service inside the service network
const CORE_DNS_SERVICE_OFFSET: u128 = 10;

/// `api.<domain>`
#[must_use]
pub fn api_server_domain(domain: &str) -> String {
    format!("{API_SERVER_DOMAIN_PREFIX}.{domain}")
}

/// Address at `offset` inside `cidr`.
///
/// # Errors
///
/// Returns [`ShootError::InvalidCidr`] if the CIDR does not parse or the
/// offset lies outside of it.
pub fn nth_address(cidr: &str, offset: u128) -> Result<IpAddr, ShootError> {
    let invalid = |reason: &str| ShootError::InvalidCidr {
        cidr: cidr.to_string(),
        reason: reason.to_string(),
    };

    let (address, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| invalid("missing prefix length"))?;
    let address: IpAddr = address.parse().map_err(|_| invalid("malformed address"))?;
    let prefix: u32 = prefix.parse().map_err(|_| invalid("malformed prefix length"))?;

    let bits = match address {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    if prefix > bits {
        return Err(invalid("prefix length out of range"));
    }

    let host_bits = bits - prefix;
    if host_bits < 128 && offset >= 1u128 << host_bits {
        return Err(invalid("network too small"));
    }

    Ok(match address {
        IpAddr::V4(v4) => {
            let mask = if host_bits == 32 { 0 } else { u32::MAX << host_bits };
            let base = u32::from(v4) & mask;
            // offset fits into the host bits, which are at most 32 here
            IpAddr::V4(Ipv4Addr::from(base | offset as u32))
        }
        IpAddr::V6(v6) => {
            let mask = if host_bits == 128 { 0 } else { u128::MAX << host_bits };
            IpAddr::V6(Ipv6Addr::from((u128::from(v6) & mask) | offset))
        }
    })
}

/// Network ranges of the shoot and the service addresses derived from them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Networks {
    pub pods: Option<String>,
    pub services: String,
    pub nodes: Option<String>,
    /// Cluster IP of the `kubernetes` service
    pub api_server: IpAddr,
    /// Cluster IP of the cluster DNS service
    pub core_dns: IpAddr,
}

impl Networks {
    /// # Errors
    ///
    /// Returns an error if the service network is missing or malformed.
    pub fn from_shoot(shoot: &Shoot) -> Result<Self, ShootError> {
        let networking = &shoot.spec.networking;
        let services = networking
            .services
            .clone()
            .ok_or_else(|| ShootError::MissingNetwork {
                shoot: shoot.name_any(),
                network: "services".to_string(),
            })?;

        Ok(Self {
            pods: networking.pods.clone(),
            nodes: networking.nodes.clone(),
            api_server: nth_address(&services, API_SERVER_SERVICE_OFFSET)?,
            core_dns: nth_address(&services, CORE_DNS_SERVICE_OFFSET)?,
            services,
        })
    }
}

/// A shoot plus everything the botanist derives from it.
#[derive(Clone, Debug)]
pub struct ShootContext {
    pub info: Shoot,
    pub project_name: String,
    /// Namespace in the seed holding the control plane
    pub seed_namespace: String,
    pub internal_cluster_domain: String,
    pub external_cluster_domain: Option<String>,
    /// Address the kube-apiserver is exposed under (load balancer IP or host)
    pub api_server_address: String,
    /// Cluster IP of the kube-apiserver service in the seed
    pub api_server_cluster_ip: Option<String>,
    pub networks: Networks,
    pub wants_vertical_pod_autoscaler: bool,
    pub konnectivity_tunnel_enabled: bool,
    pub logging_enabled: bool,
    pub seed_ingress_domain: String,
    /// The seed manages DNS records for its shoots
    pub seed_shoot_dns_enabled: bool,
    /// Infrastructure credentials of the shoot, from its project
    pub cloud_provider_secret: Option<Secret>,
}

impl ShootContext {
    /// # Errors
    ///
    /// Returns an error if the shoot's networks are unusable.
    pub fn new(
        info: Shoot,
        project_name: &str,
        internal_cluster_domain: &str,
        api_server_address: &str,
        config: &BotanistConfig,
    ) -> Result<Self, ShootError> {
        let networks = Networks::from_shoot(&info)?;
        let seed_namespace = info
            .status
            .as_ref()
            .and_then(|s| s.technical_id.clone())
            .unwrap_or_else(|| format!("shoot--{project_name}--{}", info.name_any()));
        let external_cluster_domain = info.spec.dns.as_ref().and_then(|d| d.domain.clone());
        let wants_vertical_pod_autoscaler = info
            .spec
            .kubernetes
            .vertical_pod_autoscaler
            .as_ref()
            .is_some_and(|v| v.enabled);

        Ok(Self {
            project_name: project_name.to_string(),
            seed_namespace,
            internal_cluster_domain: internal_cluster_domain.to_string(),
            external_cluster_domain,
            api_server_address: api_server_address.to_string(),
            api_server_cluster_ip: None,
            networks,
            wants_vertical_pod_autoscaler,
            konnectivity_tunnel_enabled: config.feature_gates.konnectivity_tunnel,
            logging_enabled: config.feature_gates.logging,
            seed_ingress_domain: config.seed_ingress_domain.clone(),
            seed_shoot_dns_enabled: config.seed_shoot_dns_enabled,
            cloud_provider_secret: None,
            info,
        })
    }

    #[must_use]
    pub fn with_api_server_cluster_ip(mut self, cluster_ip: Option<String>) -> Self {
        self.api_server_cluster_ip = cluster_ip;
        self
    }

    #[must_use]
    pub fn with_cloud_provider_secret(mut self, secret: Option<Secret>) -> Self {
        self.cloud_provider_secret = secret;
        self
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.info.name_any()
    }

    /// Project namespace of the shoot in the garden cluster.
    #[must_use]
    pub fn project_namespace(&self) -> String {
        self.info.namespace().unwrap_or_default()
    }

    /// Basic authentication is on unless the shoot disables it explicitly.
    #[must_use]
    pub fn wants_basic_authentication(&self) -> bool {
        self.info
            .spec
            .kubernetes
            .kube_api_server
            .as_ref()
            .and_then(|c| c.enable_basic_authentication)
            .unwrap_or(true)
    }

    /// Some worker pool can grow beyond its minimum size.
    #[must_use]
    pub fn wants_cluster_autoscaler(&self) -> bool {
        self.info
            .spec
            .provider
            .workers
            .iter()
            .any(|w| w.maximum > w.minimum)
    }

    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.info.metadata.deletion_timestamp.is_some()
    }

    /// Value of the operation annotation, preferring the current key.
    #[must_use]
    pub fn operation_annotation(&self) -> Option<&str> {
        let annotations = self.info.metadata.annotations.as_ref()?;
        annotations
            .get(GARDENER_OPERATION)
            .or_else(|| annotations.get(SHOOT_OPERATION_DEPRECATED))
            .map(String::as_str)
    }

    #[must_use]
    pub fn wants_kubeconfig_rotation(&self) -> bool {
        self.operation_annotation() == Some(OPERATION_ROTATE_KUBECONFIG_CREDENTIALS)
    }

    #[must_use]
    pub fn wants_kyma(&self) -> bool {
        self.info
            .metadata
            .annotations
            .as_ref()
            .is_some_and(|a| a.contains_key(SHOOT_EXPERIMENTAL_ADDON_KYMA))
    }

    #[must_use]
    pub fn purpose(&self) -> Option<&str> {
        self.info.spec.purpose.as_deref()
    }

    #[must_use]
    pub fn ipvs_enabled(&self) -> bool {
        self.info
            .spec
            .kubernetes
            .kube_proxy
            .as_ref()
            .and_then(|p| p.mode.as_deref())
            == Some(PROXY_MODE_IPVS)
    }

    #[must_use]
    pub fn kubernetes_dashboard_enabled(&self) -> bool {
        self.info
            .spec
            .addons
            .as_ref()
            .and_then(|a| a.kubernetes_dashboard.as_ref())
            .is_some_and(|d| d.enabled)
    }

    #[must_use]
    pub fn nginx_ingress_enabled(&self) -> bool {
        self.info
            .spec
            .addons
            .as_ref()
            .and_then(|a| a.nginx_ingress.as_ref())
            .is_some_and(|n| n.enabled)
    }

    /// Extension types enabled for the shoot, in spec order.
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        self.info
            .spec
            .extensions
            .iter()
            .map(|e| e.type_.clone())
            .collect()
    }

    /// Whether the shoot runs at least Kubernetes `major.minor`.
    ///
    /// # Errors
    ///
    /// Returns [`ShootError::InvalidVersion`] if the version does not parse.
    pub fn kubernetes_version_at_least(&self, major: u64, minor: u64) -> Result<bool, ShootError> {
        let version = &self.info.spec.kubernetes.version;
        let invalid = || ShootError::InvalidVersion(version.clone());

        let mut parts = version.trim_start_matches('v').split('.');
        let have_major: u64 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let have_minor: u64 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;

        Ok((have_major, have_minor) >= (major, minor))
    }

    /// Address of the kube-apiserver as seen from inside the seed.
    ///
    /// Components in the shoot's own seed namespace use the bare service
    /// name; everything else needs the namespaced service host.
    #[must_use]
    pub fn compute_in_cluster_api_server_address(&self, runs_in_shoot_namespace: bool) -> String {
        if runs_in_shoot_namespace {
            DEPLOYMENT_NAME_KUBE_APISERVER.to_string()
        } else {
            format!("{DEPLOYMENT_NAME_KUBE_APISERVER}.{}.svc", self.seed_namespace)
        }
    }

    /// Address of the kube-apiserver as seen from outside the seed.
    #[must_use]
    pub fn compute_out_of_cluster_api_server_address(&self, use_internal_domain: bool) -> String {
        if !self.seed_shoot_dns_enabled {
            return self.api_server_address.clone();
        }
        if use_internal_domain {
            return api_server_domain(&self.internal_cluster_domain);
        }
        api_server_domain(
            self.external_cluster_domain
                .as_deref()
                .unwrap_or(&self.internal_cluster_domain),
        )
    }

    /// `<prefix>-<project>--<shoot>.<seed ingress domain>`
    #[must_use]
    pub fn compute_ingress_host(&self, prefix: &str) -> String {
        format!(
            "{prefix}-{}--{}.{}",
            self.project_name,
            self.name(),
            self.seed_ingress_domain
        )
    }

    #[must_use]
    pub fn alertmanager_hosts(&self) -> Vec<String> {
        vec![self.compute_ingress_host(INGRESS_PREFIX_ALERTMANAGER)]
    }

    #[must_use]
    pub fn grafana_hosts(&self) -> Vec<String> {
        vec![
            self.compute_ingress_host(INGRESS_PREFIX_GRAFANA_OPERATORS),
            self.grafana_users_host(),
        ]
    }

    #[must_use]
    pub fn grafana_users_host(&self) -> String {
        self.compute_ingress_host(INGRESS_PREFIX_GRAFANA_USERS)
    }

    #[must_use]
    pub fn prometheus_hosts(&self) -> Vec<String> {
        vec![self.compute_ingress_host(INGRESS_PREFIX_PROMETHEUS)]
    }

    #[must_use]
    pub fn kibana_host(&self) -> String {
        self.compute_ingress_host(INGRESS_PREFIX_KIBANA)
    }
}

#[cfg(test)]
#[path = "shoot_tests.rs"]
mod shoot_tests;
