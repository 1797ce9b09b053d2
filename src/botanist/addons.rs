// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Chart values and managed-resource bundles of a shoot.
//!
//! Values are built from the shoot facts and the secrets the deploy phase
//! recorded in the [`SecretCache`](super::cache::SecretCache). Each bundle is
//! rendered, stored as `managedresource-<name>` and referenced from a
//! `ManagedResource` of the same name.

use super::cache::{checksum_annotation, CacheState};
use super::shoot::{api_server_domain, ShootContext};
use super::Botanist;
use crate::chart::{ChartRenderer, RenderedChart};
use crate::config::FeatureGates;
use crate::constants::{
    APISERVER_PROXY_PORT, BOOTSTRAP_TOKEN_DESCRIPTION, BOOTSTRAP_TOKEN_VALIDITY_HOURS,
    CHART_CLOUD_CONFIG_EXECUTION, CHART_CLOUD_CONFIG_RBAC, CHART_SHOOT_ADDONS,
    CHART_SHOOT_ADDONS_KYMA, CHART_SHOOT_CORE, DATA_KEY_CERTIFICATE, DATA_KEY_CERTIFICATE_CA,
    DATA_KEY_DIFFIE_HELLMAN, DATA_KEY_KUBECONFIG, DATA_KEY_PRIVATE_KEY, DATA_KEY_VPN_TLS_AUTH,
    DEFAULT_DOMAIN, IMAGE_ALPINE, IMAGE_APISERVER_PROXY, IMAGE_APISERVER_PROXY_SIDECAR,
    IMAGE_BLACKBOX_EXPORTER, IMAGE_COREDNS, IMAGE_INGRESS_DEFAULT_BACKEND,
    IMAGE_KONNECTIVITY_AGENT, IMAGE_KUBERNETES_DASHBOARD,
    IMAGE_KUBERNETES_DASHBOARD_METRICS_SCRAPER, IMAGE_KUBE_PROXY, IMAGE_METRICS_SERVER,
    IMAGE_NGINX_INGRESS_CONTROLLER, IMAGE_NODE_EXPORTER, IMAGE_NODE_PROBLEM_DETECTOR,
    IMAGE_VPN_SHOOT, LEGACY_CLOUD_CONFIG_SECRET, MANAGED_RESOURCE_ADDONS,
    MANAGED_RESOURCE_CLOUD_CONFIG_EXECUTION, MANAGED_RESOURCE_CORE_NAMESPACES,
    MANAGED_RESOURCE_KYMA, MANAGED_RESOURCE_SHOOT_CORE, NAMESPACE_KUBE_SYSTEM,
    NAMESPACE_KYMA_INSTALLER, SECRET_NAME_CA_METRICS_SERVER, SECRET_NAME_KONNECTIVITY_AGENT,
    SECRET_NAME_KUBE_PROXY, SECRET_NAME_METRICS_SERVER, SECRET_NAME_OPENVPN_DIFFIE_HELLMAN,
    SECRET_NAME_VPN_SEED_TLS_AUTH, SECRET_NAME_VPN_SHOOT, SHOOT_PURPOSE_TESTING,
};
use crate::crd::Worker;
use crate::errors::SecretsError;
use crate::flow::{self, Task};
use crate::imagevector::ImageVector;
use crate::labels::{GARDENER_PURPOSE, MANAGED_RESOURCE};
use crate::metrics;
use crate::reconcilers::bootstrap_token::compute_bootstrap_token;
use crate::reconcilers::managed_resources::{
    build_managed_resource, build_managed_resource_secret, create_or_update_managed_resource,
    create_or_update_secret, deploy_managed_resource, managed_resource_secret_name,
};
use crate::reconcilers::resources::delete_ignore_not_found;
use crate::secrets::SecretData;
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::FutureExt;
use k8s_openapi::api::core::v1::Secret;
use kube::Api;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `{"enabled": enabled}`, merged with the entries of `values` when enabled.
#[must_use]
pub fn generate_addon_config(values: Value, enabled: bool) -> Value {
    let mut config = Map::new();
    config.insert("enabled".to_string(), Value::Bool(enabled));

    if enabled {
        if let Value::Object(entries) = values {
            config.extend(entries);
        }
    }

    Value::Object(config)
}

/// A chart rendered into one managed resource.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartBundle {
    /// Name of the managed resource
    pub name: String,
    pub chart_path: PathBuf,
    pub release: String,
    pub namespace: String,
    pub values: Value,
    pub keep_objects: bool,
}

/// Render `bundle`, naming the bundle in the error.
///
/// # Errors
///
/// Returns an error if the renderer fails.
pub async fn render_bundle(renderer: &dyn ChartRenderer, bundle: &ChartBundle) -> Result<RenderedChart> {
    renderer
        .render(&bundle.chart_path, &bundle.release, &bundle.namespace, &bundle.values)
        .await
        .with_context(|| format!("error rendering {:?} chart", bundle.name))
}

/// Builds chart values from shoot facts and deployed secrets.
pub struct AddonValues<'a> {
    pub shoot: &'a ShootContext,
    pub images: &'a ImageVector,
    pub state: &'a CacheState,
    pub feature_gates: &'a FeatureGates,
}

impl AddonValues<'_> {
    /// Base64 of `secret[key]`, the way byte values appear in chart values.
    fn secret_value(&self, secret: &str, key: &str) -> Result<String, SecretsError> {
        self.state
            .secret(secret)
            .and_then(|s| s.data.as_ref())
            .and_then(|data| data.get(key))
            .map(|value| STANDARD.encode(&value.0))
            .ok_or_else(|| SecretsError::MissingDataKey {
                secret: secret.to_string(),
                key: key.to_string(),
            })
    }

    fn secret_data(&self, secret: &str) -> Result<Value, SecretsError> {
        let data = self
            .state
            .secret(secret)
            .and_then(|s| s.data.as_ref())
            .ok_or_else(|| SecretsError::NotGenerated(secret.to_string()))?;

        Ok(Value::Object(
            data.iter()
                .map(|(k, v)| (k.clone(), Value::String(STANDARD.encode(&v.0))))
                .collect(),
        ))
    }

    fn with_images(&self, mut values: Value, names: &[&str]) -> Result<Value> {
        self.images.inject_images(&mut values, names)?;
        Ok(values)
    }

    fn pod_annotation(&self, secret: &str) -> Value {
        json!({ checksum_annotation(secret): self.state.checksum(secret) })
    }

    fn shoot_info(&self) -> Value {
        let shoot = self.shoot;
        let spec = &shoot.info.spec;
        let mut info = json!({
            "projectName": shoot.project_name,
            "shootName": shoot.name(),
            "provider": spec.provider.type_,
            "region": spec.region,
            "kubernetesVersion": spec.kubernetes.version,
            "podNetwork": shoot.networks.pods,
            "serviceNetwork": shoot.networks.services,
            "extensions": shoot.extensions().join(","),
        });

        if let Some(window) = spec.maintenance.as_ref().and_then(|m| m.time_window.as_ref()) {
            info["maintenanceBegin"] = json!(window.begin);
            info["maintenanceEnd"] = json!(window.end);
        }
        if let Some(domain) = &shoot.external_cluster_domain {
            info["domain"] = json!(domain);
        }
        if let Some(nodes) = &shoot.networks.nodes {
            info["nodeNetwork"] = json!(nodes);
        }
        info
    }

    fn tunnel(&self) -> Result<(&'static str, Value)> {
        let shoot = self.shoot;

        if shoot.konnectivity_tunnel_enabled {
            let agent = self.with_images(
                json!({
                    "proxyHost": api_server_domain(&shoot.internal_cluster_domain),
                    "podAnnotations": self.pod_annotation(SECRET_NAME_KONNECTIVITY_AGENT),
                }),
                &[IMAGE_KONNECTIVITY_AGENT],
            )?;
            return Ok(("konnectivity-agent", generate_addon_config(agent, true)));
        }

        let mut vpn_shoot = json!({
            "podNetwork": shoot.networks.pods,
            "serviceNetwork": shoot.networks.services,
            "tlsAuth": self.secret_value(SECRET_NAME_VPN_SEED_TLS_AUTH, DATA_KEY_VPN_TLS_AUTH)?,
            "vpnShootSecretData": {
                "ca": self.secret_value(SECRET_NAME_VPN_SHOOT, DATA_KEY_CERTIFICATE_CA)?,
                "tlsCrt": self.secret_value(SECRET_NAME_VPN_SHOOT, DATA_KEY_CERTIFICATE)?,
                "tlsKey": self.secret_value(SECRET_NAME_VPN_SHOOT, DATA_KEY_PRIVATE_KEY)?,
            },
            "podAnnotations": self.pod_annotation(SECRET_NAME_VPN_SHOOT),
        });
        if self.state.secret(SECRET_NAME_OPENVPN_DIFFIE_HELLMAN).is_some() {
            vpn_shoot["diffieHellmanKey"] = json!(
                self.secret_value(SECRET_NAME_OPENVPN_DIFFIE_HELLMAN, DATA_KEY_DIFFIE_HELLMAN)?
            );
        }
        if let Some(nodes) = &shoot.networks.nodes {
            vpn_shoot["nodeNetwork"] = json!(nodes);
        }

        let vpn_shoot = self.with_images(vpn_shoot, &[IMAGE_VPN_SHOOT])?;
        Ok(("vpn-shoot", generate_addon_config(vpn_shoot, true)))
    }

    /// Values of the `shoot-core` components chart.
    ///
    /// # Errors
    ///
    /// Returns an error if a required secret or image is missing.
    pub fn core_addons(&self) -> Result<Value> {
        let shoot = self.shoot;
        let spec = &shoot.info.spec;

        let core_dns = self.with_images(
            json!({
                "service": {
                    "clusterDNS": shoot.networks.core_dns.to_string(),
                    "domain": { "clusterDomain": DEFAULT_DOMAIN },
                },
            }),
            &[IMAGE_COREDNS],
        )?;

        let mut kube_proxy = json!({
            "kubeconfig": self.secret_value(SECRET_NAME_KUBE_PROXY, DATA_KEY_KUBECONFIG)?,
            "kubernetesVersion": spec.kubernetes.version,
            "podAnnotations": self.pod_annotation(SECRET_NAME_KUBE_PROXY),
            "enableIPVS": shoot.ipvs_enabled(),
        });
        if let Some(proxy) = &spec.kubernetes.kube_proxy {
            kube_proxy["featureGates"] = json!(proxy.feature_gates);
        }
        let kube_proxy = self.with_images(kube_proxy, &[IMAGE_KUBE_PROXY, IMAGE_ALPINE])?;

        let metrics_server = self.with_images(
            json!({
                "tls": {
                    "caBundle": self.secret_value(SECRET_NAME_CA_METRICS_SERVER, DATA_KEY_CERTIFICATE_CA)?,
                },
                "secret": { "data": self.secret_data(SECRET_NAME_METRICS_SERVER)? },
            }),
            &[IMAGE_METRICS_SERVER],
        )?;

        let api_server_proxy = self.with_images(
            json!({
                "advertiseIPAddress": shoot.api_server_cluster_ip,
                "proxySeedServer": format!(
                    "{}:{APISERVER_PROXY_PORT}",
                    shoot.compute_out_of_cluster_api_server_address(true)
                ),
            }),
            &[IMAGE_APISERVER_PROXY_SIDECAR, IMAGE_APISERVER_PROXY],
        )?;

        let monitoring = json!({
            "node-exporter": self.with_images(json!({}), &[IMAGE_NODE_EXPORTER])?,
            "blackbox-exporter": self.with_images(json!({}), &[IMAGE_BLACKBOX_EXPORTER])?,
        });
        let node_problem_detector = self.with_images(json!({}), &[IMAGE_NODE_PROBLEM_DETECTOR])?;

        let vertical_pod_autoscaler = json!({
            "admissionController": { "enableServiceAccount": false },
            "exporter": { "enableServiceAccount": false },
            "recommender": { "enableServiceAccount": false },
            "updater": { "enableServiceAccount": false },
        });

        let mut values = json!({
            "global": {
                "kubernetesVersion": spec.kubernetes.version,
                "podNetwork": shoot.networks.pods,
                "vpaEnabled": shoot.wants_vertical_pod_autoscaler,
            },
            "cluster-autoscaler": generate_addon_config(Value::Null, shoot.wants_cluster_autoscaler()),
            "coredns": core_dns,
            "kube-apiserver-kubelet": generate_addon_config(Value::Null, true),
            "apiserver-proxy": generate_addon_config(api_server_proxy, self.feature_gates.api_server_sni),
            "kube-controller-manager": generate_addon_config(Value::Null, true),
            "kube-proxy": generate_addon_config(kube_proxy, true),
            "kube-scheduler": generate_addon_config(Value::Null, true),
            "metrics-server": generate_addon_config(metrics_server, true),
            "monitoring": generate_addon_config(monitoring, shoot.purpose() != Some(SHOOT_PURPOSE_TESTING)),
            "network-policies": generate_addon_config(json!({}), true),
            "node-problem-detector": generate_addon_config(node_problem_detector, true),
            "podsecuritypolicies": generate_addon_config(json!({
                "allowPrivilegedContainers": spec.kubernetes.allow_privileged_containers.unwrap_or(true),
            }), true),
            "shoot-info": generate_addon_config(self.shoot_info(), true),
            "vertical-pod-autoscaler": generate_addon_config(vertical_pod_autoscaler, shoot.wants_vertical_pod_autoscaler),
            "cluster-identity": {
                "clusterIdentity": shoot.info.status.as_ref().and_then(|s| s.cluster_identity.clone()),
            },
        });

        let (tunnel_key, tunnel) = self.tunnel()?;
        values[tunnel_key] = tunnel;
        Ok(values)
    }

    /// Values of the `shoot-core` namespaces chart.
    #[must_use]
    pub fn core_namespaces(&self) -> Value {
        json!({ "labels": { GARDENER_PURPOSE: NAMESPACE_KUBE_SYSTEM } })
    }

    /// Values of the optional addons chart.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kubernetes version does not parse or an image is missing.
    pub fn optional_addons(&self) -> Result<Value> {
        let shoot = self.shoot;
        let addons = shoot.info.spec.addons.as_ref();

        let dashboard_enabled = shoot.kubernetes_dashboard_enabled();
        let mut dashboard = json!({});
        if let Some(mode) = addons
            .and_then(|a| a.kubernetes_dashboard.as_ref())
            .and_then(|d| d.authentication_mode.as_ref())
        {
            dashboard["authenticationMode"] = json!(mode);
        }
        let mut dashboard_images = vec![IMAGE_KUBERNETES_DASHBOARD];
        if shoot.kubernetes_version_at_least(1, 16)? {
            dashboard_images.push(IMAGE_KUBERNETES_DASHBOARD_METRICS_SCRAPER);
        }
        let dashboard = self.with_images(
            generate_addon_config(dashboard, dashboard_enabled),
            &dashboard_images,
        )?;

        let nginx_enabled = shoot.nginx_ingress_enabled();
        let nginx = match addons.and_then(|a| a.nginx_ingress.as_ref()) {
            Some(nginx) if nginx_enabled => json!({
                "controller": {
                    "customConfig": nginx.config,
                    "service": {
                        "loadBalancerSourceRanges": nginx.load_balancer_source_ranges,
                        "externalTrafficPolicy": nginx.external_traffic_policy.as_deref().unwrap_or("Cluster"),
                    },
                },
            }),
            _ => Value::Null,
        };
        let nginx = self.with_images(
            generate_addon_config(nginx, nginx_enabled),
            &[IMAGE_NGINX_INGRESS_CONTROLLER, IMAGE_INGRESS_DEFAULT_BACKEND],
        )?;

        Ok(json!({
            "global": { "vpaEnabled": shoot.wants_vertical_pod_autoscaler },
            "kubernetes-dashboard": dashboard,
            "nginx-ingress": nginx,
        }))
    }

    /// Values of the kyma chart.
    #[must_use]
    pub fn kyma(&self) -> Value {
        json!({ "kyma": generate_addon_config(Value::Null, self.shoot.wants_kyma()) })
    }

    /// The four addon bundles, in deploy order.
    ///
    /// # Errors
    ///
    /// Returns an error naming the bundle whose values cannot be built.
    pub fn bundles(&self, chart_root: &Path) -> Result<Vec<ChartBundle>> {
        let core = self
            .core_addons()
            .with_context(|| format!("error rendering {MANAGED_RESOURCE_SHOOT_CORE:?} chart"))?;
        let optional = self
            .optional_addons()
            .with_context(|| format!("error rendering {MANAGED_RESOURCE_ADDONS:?} chart"))?;

        Ok(vec![
            ChartBundle {
                name: MANAGED_RESOURCE_SHOOT_CORE.to_string(),
                chart_path: chart_root.join(CHART_SHOOT_CORE).join("components"),
                release: CHART_SHOOT_CORE.to_string(),
                namespace: NAMESPACE_KUBE_SYSTEM.to_string(),
                values: core,
                keep_objects: false,
            },
            ChartBundle {
                name: MANAGED_RESOURCE_CORE_NAMESPACES.to_string(),
                chart_path: chart_root.join(CHART_SHOOT_CORE).join("namespaces"),
                release: MANAGED_RESOURCE_CORE_NAMESPACES.to_string(),
                namespace: NAMESPACE_KUBE_SYSTEM.to_string(),
                values: self.core_namespaces(),
                keep_objects: true,
            },
            ChartBundle {
                name: MANAGED_RESOURCE_ADDONS.to_string(),
                chart_path: chart_root.join(CHART_SHOOT_ADDONS),
                release: MANAGED_RESOURCE_ADDONS.to_string(),
                namespace: NAMESPACE_KUBE_SYSTEM.to_string(),
                values: optional,
                keep_objects: false,
            },
            ChartBundle {
                name: MANAGED_RESOURCE_KYMA.to_string(),
                chart_path: chart_root.join(CHART_SHOOT_ADDONS_KYMA),
                release: "kyma".to_string(),
                namespace: NAMESPACE_KYMA_INSTALLER.to_string(),
                values: self.kyma(),
                keep_objects: false,
            },
        ])
    }
}

/// Name of the cloud-config execution chart of worker pool `pool`.
#[must_use]
pub fn cloud_config_execution_name(pool: &str) -> String {
    format!("{CHART_CLOUD_CONFIG_EXECUTION}-{pool}")
}

fn cloud_config_execution_values(shoot: &ShootContext, worker: &Worker, bootstrap_token: &str) -> Value {
    let mut worker_values = json!({
        "name": worker.name,
        "machineType": worker.machine.type_,
    });
    if let Some(image) = &worker.machine.image {
        worker_values["machineImage"] = json!({ "name": image.name, "version": image.version });
    }

    json!({
        "bootstrapToken": bootstrap_token,
        "kubernetesVersion": shoot.info.spec.kubernetes.version,
        "apiServerURL": format!("https://{}", shoot.compute_out_of_cluster_api_server_address(true)),
        "secretName": format!("cloud-config-{}", worker.name),
        "worker": worker_values,
    })
}

/// The shared RBAC chart followed by one execution chart per worker pool.
#[must_use]
pub fn cloud_config_bundles(chart_root: &Path, shoot: &ShootContext, bootstrap_token: &str) -> Vec<ChartBundle> {
    let rbac = ChartBundle {
        name: CHART_CLOUD_CONFIG_RBAC.to_string(),
        chart_path: chart_root.join(CHART_CLOUD_CONFIG_RBAC),
        release: CHART_CLOUD_CONFIG_RBAC.to_string(),
        namespace: NAMESPACE_KUBE_SYSTEM.to_string(),
        values: json!({}),
        keep_objects: false,
    };

    std::iter::once(rbac)
        .chain(shoot.info.spec.provider.workers.iter().map(|worker| {
            let name = cloud_config_execution_name(&worker.name);
            ChartBundle {
                chart_path: chart_root.join(CHART_CLOUD_CONFIG_EXECUTION),
                release: name.clone(),
                namespace: NAMESPACE_KUBE_SYSTEM.to_string(),
                values: cloud_config_execution_values(shoot, worker, bootstrap_token),
                keep_objects: false,
                name,
            }
        }))
        .collect()
}

impl Botanist {
    /// Render every addon chart and reconcile its managed resource.
    ///
    /// # Errors
    ///
    /// Returns an error if values cannot be built, a chart fails to render or
    /// an API call fails.
    pub async fn deploy_managed_resources(&self) -> Result<()> {
        let namespace = &self.shoot.seed_namespace;

        if self.shoot.konnectivity_tunnel_enabled {
            let shoot_secrets: Api<Secret> =
                Api::namespaced(self.shoot_client.clone(), NAMESPACE_KUBE_SYSTEM);
            delete_ignore_not_found(&shoot_secrets, SECRET_NAME_VPN_SHOOT).await?;
        }

        let state = self.cache.snapshot().await;
        let values = AddonValues {
            shoot: &self.shoot,
            images: &self.image_vector,
            state: &state,
            feature_gates: &self.config.feature_gates,
        };

        for bundle in values.bundles(&self.config.chart_path)? {
            let rendered = render_bundle(self.chart_renderer.as_ref(), &bundle).await?;
            deploy_managed_resource(
                &self.seed_client,
                namespace,
                &bundle.name,
                &rendered.as_secret_data(),
                bundle.keep_objects,
            )
            .await?;
            metrics::record_managed_resource_reconciled(&bundle.name);
        }

        self.deploy_cloud_config_execution_managed_resource().await
    }

    async fn deploy_cloud_config_execution_managed_resource(&self) -> Result<()> {
        let namespace = self.shoot.seed_namespace.as_str();
        let bootstrap_token = compute_bootstrap_token(
            &self.shoot_client,
            BOOTSTRAP_TOKEN_DESCRIPTION,
            chrono::Duration::hours(BOOTSTRAP_TOKEN_VALIDITY_HOURS),
        )
        .await
        .context("error computing bootstrap token for shoot cloud config")?;

        let mut rendered: Vec<(String, SecretData)> = Vec::new();
        for bundle in cloud_config_bundles(&self.config.chart_path, &self.shoot, &bootstrap_token) {
            let chart = render_bundle(self.chart_renderer.as_ref(), &bundle).await?;
            rendered.push((managed_resource_secret_name(&bundle.name), chart.as_secret_data()));
        }

        let secret_labels = BTreeMap::from([(
            MANAGED_RESOURCE.to_string(),
            MANAGED_RESOURCE_CLOUD_CONFIG_EXECUTION.to_string(),
        )]);
        let client = &self.seed_client;
        let tasks: Vec<Task<'_>> = rendered
            .iter()
            .map(|(secret_name, data)| {
                let secret =
                    build_managed_resource_secret(secret_name, namespace, data, secret_labels.clone());
                async move { create_or_update_secret(client, &secret).await.map(|_| ()) }.boxed()
            })
            .collect();
        flow::parallel(&self.cancel, "cloud-config-execution-secrets", tasks).await?;

        let secret_names: Vec<String> = rendered.into_iter().map(|(name, _)| name).collect();
        let managed_resource = build_managed_resource(
            MANAGED_RESOURCE_CLOUD_CONFIG_EXECUTION,
            namespace,
            &secret_names,
            false,
        );
        let result = create_or_update_managed_resource(client, &managed_resource).await?;
        debug!(managed_resource = MANAGED_RESOURCE_CLOUD_CONFIG_EXECUTION, result = ?result, "Managed resource reconciled");
        metrics::record_managed_resource_reconciled(MANAGED_RESOURCE_CLOUD_CONFIG_EXECUTION);

        let wanted: BTreeSet<String> = secret_names.into_iter().collect();
        self.delete_stale_secrets_matching_labels(&secret_labels, &wanted)
            .await?;

        if self.config.legacy_secret_cleanup {
            let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
            delete_ignore_not_found(&secrets, LEGACY_CLOUD_CONFIG_SECRET).await?;
        }

        info!(namespace = %namespace, "Cloud config execution bundle reconciled");
        Ok(())
    }
}

#[cfg(test)]
#[path = "addons_tests.rs"]
mod addons_tests;
