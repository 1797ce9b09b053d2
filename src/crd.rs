// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions consumed and produced by the botanist.
//!
//! Only the fields the botanist reads are modelled; unknown fields are
//! ignored on deserialization.
//!
//! # Resource Types
//!
//! - [`Shoot`] - the end-user cluster specification (read, annotations updated)
//! - [`ShootState`] - durable ledger of generated secret material
//! - [`ManagedResource`] - a bundle of manifests applied into the shoot by a
//!   separate controller
//!
//! # Example: Reading the ledger
//!
//! ```rust,no_run
//! use botanist::crd::ShootState;
//! use kube::{Api, Client};
//!
//! # async fn example(client: Client) -> anyhow::Result<()> {
//! let api: Api<ShootState> = Api::namespaced(client, "garden-dev");
//! if let Some(state) = api.get_opt("my-shoot").await? {
//!     println!("{} ledger entries", state.spec.gardener.len());
//! }
//! # Ok(())
//! # }
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Shoot
// ============================================================================

/// Dashboard addon settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesDashboard {
    pub enabled: bool,
    /// `basic` or `token`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_mode: Option<String>,
}

/// Nginx ingress addon settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NginxIngress {
    pub enabled: bool,
    /// Free-form controller configuration passed to the chart
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancer_source_ranges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_traffic_policy: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Addons {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes_dashboard: Option<KubernetesDashboard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nginx_ingress: Option<NginxIngress>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dns {
    /// External domain of the shoot, e.g. `my-shoot.my-project.example.com`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubeProxyConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub feature_gates: BTreeMap<String, bool>,
    /// `IPTables` or `IPVS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubeApiServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_basic_authentication: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerticalPodAutoscaler {
    pub enabled: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kubernetes {
    /// Semantic version, e.g. `1.18.2`
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_privileged_containers: Option<bool>,
    #[serde(rename = "kubeAPIServer", skip_serializing_if = "Option::is_none")]
    pub kube_api_server: Option<KubeApiServerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kube_proxy: Option<KubeProxyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_pod_autoscaler: Option<VerticalPodAutoscaler>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Networking {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pods: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<MachineImage>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineImage {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A pool of identically configured worker nodes
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub name: String,
    pub minimum: i32,
    pub maximum: i32,
    pub machine: Machine,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub workers: Vec<Worker>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub begin: String,
    pub end: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Maintenance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
}

/// Subset of the Shoot specification read by the botanist.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "core.gardener.cloud",
    version = "v1beta1",
    kind = "Shoot",
    namespaced,
    doc = "Shoot is a managed Kubernetes cluster whose control plane runs in a seed cluster."
)]
#[kube(status = "ShootStatus")]
#[serde(rename_all = "camelCase")]
pub struct ShootSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addons: Option<Addons>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<Dns>,
    pub kubernetes: Kubernetes,
    pub networking: Networking,
    pub provider: Provider,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<Maintenance>,
    /// `evaluation`, `testing`, `development` or `production`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Extension types enabled for this shoot
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShootStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_identity: Option<String>,
    /// `shoot--<project>--<name>`, also the seed namespace
    #[serde(rename = "technicalID", skip_serializing_if = "Option::is_none")]
    pub technical_id: Option<String>,
}

// ============================================================================
// ShootState
// ============================================================================

/// A single named ledger entry.
///
/// `data` is opaque to the API server; the secrets manager owns its layout.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GardenerResourceData {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[schemars(schema_with = "opaque_object_schema")]
    pub data: serde_json::Value,
}

fn opaque_object_schema(_gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    })
}

/// Durable state of a shoot, keyed by the shoot's namespace and name.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "core.gardener.cloud",
    version = "v1alpha1",
    kind = "ShootState",
    namespaced,
    doc = "ShootState stores the generated secret material of a Shoot so it survives control-plane migration."
)]
#[serde(rename_all = "camelCase")]
pub struct ShootStateSpec {
    #[serde(default)]
    pub gardener: Vec<GardenerResourceData>,
}

// ============================================================================
// ManagedResource
// ============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    pub name: String,
}

/// A bundle of manifests stored in secrets, applied into the shoot by the
/// resource manager.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "resources.gardener.cloud",
    version = "v1alpha1",
    kind = "ManagedResource",
    namespaced,
    doc = "ManagedResource references secrets whose manifests are applied into the target cluster."
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedResourceSpec {
    #[serde(default)]
    pub secret_refs: Vec<SecretReference>,
    /// Labels added to every applied object
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub injected_labels: BTreeMap<String, String>,
    /// Leave objects in the shoot when the managed resource is deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_objects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}
