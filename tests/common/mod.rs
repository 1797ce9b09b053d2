// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use botanist::chart::{ChartRenderer, RenderedChart};
use botanist::config::BotanistConfig;
use botanist::crd::{
    Kubernetes, Machine, Networking, Provider, Shoot, ShootSpec, ShootStatus, Worker,
};
use botanist::errors::ChartError;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, PostParams};
use kube::client::Client;
use std::collections::BTreeMap;
use std::path::Path;

pub const PROJECT: &str = "it";
pub const INTERNAL_DOMAIN: &str = "local.it.internal.example.com";
pub const API_SERVER_ADDRESS: &str = "10.0.0.1";

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => {
            println!("✓ Successfully connected to Kubernetes cluster");
            Some(client)
        }
        Err(e) => {
            eprintln!("⊘ Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

/// Create a test namespace
pub async fn create_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let test_ns = Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([
                ("test".to_string(), "integration".to_string()),
                ("managed-by".to_string(), "botanist-test".to_string()),
            ])),
            ..Default::default()
        },
        ..Default::default()
    };

    match namespaces.create(&PostParams::default(), &test_ns).await {
        Ok(_) => {
            println!("✓ Created test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            println!("  Test namespace already exists: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Delete a test namespace
pub async fn delete_test_namespace(client: &Client, name: &str) {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    match namespaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => println!("✓ Deleted test namespace: {name}"),
        Err(e) => eprintln!("  Failed to delete test namespace {name}: {e}"),
    }
}

/// A shoot whose seed and project namespace are both `namespace`.
pub fn test_shoot(namespace: &str, name: &str) -> Shoot {
    let mut shoot = Shoot::new(
        name,
        ShootSpec {
            kubernetes: Kubernetes {
                version: "1.18.2".to_string(),
                ..Kubernetes::default()
            },
            networking: Networking {
                type_: "calico".to_string(),
                pods: Some("100.96.0.0/11".to_string()),
                nodes: Some("10.250.0.0/16".to_string()),
                services: Some("100.64.0.0/13".to_string()),
            },
            provider: Provider {
                type_: "local".to_string(),
                workers: vec![Worker {
                    name: "worker".to_string(),
                    minimum: 1,
                    maximum: 1,
                    machine: Machine {
                        type_: "local".to_string(),
                        image: None,
                    },
                }],
            },
            region: "local".to_string(),
            ..ShootSpec::default()
        },
    );
    shoot.metadata.namespace = Some(namespace.to_string());
    shoot.status = Some(ShootStatus {
        cluster_identity: Some(format!("{namespace}-{name}")),
        technical_id: Some(namespace.to_string()),
    });
    shoot
}

pub fn test_config() -> BotanistConfig {
    BotanistConfig {
        seed_ingress_domain: "ingress.it.example.com".to_string(),
        ..BotanistConfig::default()
    }
}

/// Renders every chart into a single config map manifest.
pub struct StaticRenderer;

#[async_trait]
impl ChartRenderer for StaticRenderer {
    async fn render(
        &self,
        _chart_path: &Path,
        release: &str,
        namespace: &str,
        _values: &serde_json::Value,
    ) -> Result<RenderedChart, ChartError> {
        let output = format!(
            "---\n# Source: {release}/templates/configmap.yaml\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: {release}\n  namespace: {namespace}\n"
        );
        Ok(RenderedChart::parse(release, &output))
    }
}

/// Image vector listing every image the addon charts reference.
pub const IMAGE_VECTOR: &str = r#"
images:
- {name: coredns, repository: registry.example.com/coredns, tag: "1.6.3"}
- {name: hyperkube, repository: registry.example.com/hyperkube, tag: "v1.18.2"}
- {name: alpine, repository: registry.example.com/alpine, tag: "3.12"}
- {name: metrics-server, repository: registry.example.com/metrics-server}
- {name: node-exporter, repository: registry.example.com/node-exporter}
- {name: blackbox-exporter, repository: registry.example.com/blackbox-exporter}
- {name: node-problem-detector, repository: registry.example.com/node-problem-detector}
- {name: apiserver-proxy, repository: registry.example.com/apiserver-proxy}
- {name: apiserver-proxy-sidecar, repository: registry.example.com/apiserver-proxy-sidecar}
- {name: vpn-shoot, repository: registry.example.com/vpn-shoot}
- {name: konnectivity-agent, repository: registry.example.com/konnectivity-agent}
- {name: kubernetes-dashboard, repository: registry.example.com/kubernetes-dashboard}
- {name: kubernetes-dashboard-metrics-scraper, repository: registry.example.com/metrics-scraper}
- {name: nginx-ingress-controller, repository: registry.example.com/nginx-ingress-controller}
- {name: ingress-default-backend, repository: registry.example.com/ingress-default-backend}
"#;
