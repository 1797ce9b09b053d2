// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the botanist.
//!
//! This module contains the well-known secret names, user names, data keys and
//! numeric defaults used when provisioning a shoot control plane.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group of the `Shoot` and `ShootState` resources
pub const API_GROUP_CORE: &str = "core.gardener.cloud";

/// API group of the `ManagedResource` resource
pub const API_GROUP_RESOURCES: &str = "resources.gardener.cloud";

/// Kind name for `Shoot` resource
pub const KIND_SHOOT: &str = "Shoot";

/// Namespace holding system components of a cluster
pub const NAMESPACE_KUBE_SYSTEM: &str = "kube-system";

/// Namespace on the seed holding seed-wide resources such as the wildcard certificate
pub const NAMESPACE_GARDEN: &str = "garden";

/// Default cluster DNS domain
pub const DEFAULT_DOMAIN: &str = "cluster.local";

/// Name of the Gardener system user
pub const GARDENER_NAME: &str = "system:gardener";

/// Group with unrestricted access to a cluster
pub const SYSTEM_PRIVILEGED_GROUP: &str = "system:masters";

// ============================================================================
// Certificate Authority Secret Names
// ============================================================================

/// Cluster CA signing most control-plane certificates
pub const SECRET_NAME_CA_CLUSTER: &str = "ca";

/// CA for etcd peers and clients
pub const SECRET_NAME_CA_ETCD: &str = "ca-etcd";

/// CA for the aggregation layer front proxy
pub const SECRET_NAME_CA_FRONT_PROXY: &str = "ca-front-proxy";

/// CA for kubelet serving certificates
pub const SECRET_NAME_CA_KUBELET: &str = "ca-kubelet";

/// CA for the metrics-server
pub const SECRET_NAME_CA_METRICS_SERVER: &str = "ca-metrics-server";

// ============================================================================
// Control Plane Secret Names
// ============================================================================

/// Secret holding all static tokens of the kube-apiserver
pub const SECRET_NAME_STATIC_TOKEN: &str = "static-token";

/// Secret holding the kube-apiserver basic-auth CSV
pub const SECRET_NAME_BASIC_AUTH: &str = "kube-apiserver-basic-auth";

/// Secret holding the end-user kubeconfig
pub const SECRET_NAME_KUBECFG: &str = "kubecfg";

/// Name of the kube-apiserver server certificate secret
pub const SECRET_NAME_KUBE_APISERVER: &str = "kube-apiserver";

/// Secret holding the kube-controller-manager serving certificate
pub const SECRET_NAME_KUBE_CONTROLLER_MANAGER_SERVER: &str = "kube-controller-manager-server";

/// Secret holding the kube-scheduler serving certificate
pub const SECRET_NAME_KUBE_SCHEDULER_SERVER: &str = "kube-scheduler-server";

/// Secret of the cluster-autoscaler
pub const SECRET_NAME_CLUSTER_AUTOSCALER: &str = "cluster-autoscaler";

/// Kubeconfig secret used by Gardener through the external endpoint
pub const SECRET_NAME_GARDENER: &str = "gardener";

/// Kubeconfig secret used by Gardener through the in-cluster endpoint
pub const SECRET_NAME_GARDENER_INTERNAL: &str = "gardener-internal";

/// SSH keypair for the worker nodes
pub const SECRET_NAME_SSH_KEYPAIR: &str = "ssh-keypair";

/// RSA key signing service account tokens
pub const SECRET_NAME_SERVICE_ACCOUNT_KEY: &str = "service-account-key";

/// Secret holding the etcd server certificate
pub const SECRET_NAME_ETCD_SERVER_TLS: &str = "etcd-server-cert";

/// Secret holding the etcd client certificate
pub const SECRET_NAME_ETCD_CLIENT_TLS: &str = "etcd-client-tls";

/// Secret holding the metrics-server certificate
pub const SECRET_NAME_METRICS_SERVER: &str = "metrics-server";

/// Ingress certificate of the alertmanager
pub const SECRET_NAME_ALERTMANAGER_TLS: &str = "alertmanager-tls";

/// Ingress certificate of grafana
pub const SECRET_NAME_GRAFANA_TLS: &str = "grafana-tls";

/// Ingress certificate of prometheus
pub const SECRET_NAME_PROMETHEUS_TLS: &str = "prometheus-tls";

/// Ingress certificate of kibana
pub const SECRET_NAME_KIBANA_TLS: &str = "kibana-tls";

/// Basic-auth credentials for operators of the monitoring stack
pub const SECRET_NAME_MONITORING_INGRESS: &str = "monitoring-ingress-credentials";

/// Basic-auth credentials for users of the monitoring stack
pub const SECRET_NAME_MONITORING_INGRESS_USERS: &str = "monitoring-ingress-credentials-users";

/// Basic-auth credentials for users of the logging stack
pub const SECRET_NAME_LOGGING_INGRESS_USERS: &str = "logging-ingress-credentials-users";

/// Kubeconfig of the dependency-watchdog internal probe
pub const SECRET_NAME_DEPENDENCY_WATCHDOG_INTERNAL_PROBE: &str =
    "dependency-watchdog-internal-probe";

/// Kubeconfig of the dependency-watchdog external probe
pub const SECRET_NAME_DEPENDENCY_WATCHDOG_EXTERNAL_PROBE: &str =
    "dependency-watchdog-external-probe";

/// Kubeconfig of the konnectivity-server
pub const SECRET_NAME_KONNECTIVITY_SERVER_KUBECONFIG: &str = "konnectivity-server-kubeconfig";

/// Serving certificate of the konnectivity-server
pub const SECRET_NAME_KONNECTIVITY_SERVER: &str = "konnectivity-server";

/// Secret of the konnectivity-agent running in the shoot
pub const SECRET_NAME_KONNECTIVITY_AGENT: &str = "konnectivity-agent";

/// OpenVPN server certificate running in the shoot
pub const SECRET_NAME_VPN_SHOOT: &str = "vpn-shoot";

/// OpenVPN client certificate running in the seed
pub const SECRET_NAME_VPN_SEED: &str = "vpn-seed";

/// OpenVPN static TLS-auth key
pub const SECRET_NAME_VPN_SEED_TLS_AUTH: &str = "vpn-seed-tlsauth";

/// Optional Diffie-Hellman parameters for OpenVPN
pub const SECRET_NAME_OPENVPN_DIFFIE_HELLMAN: &str = "openvpn-diffie-hellman-key";

/// Serving certificate of the VPA admission webhook
pub const SECRET_NAME_VPA_TLS_CERTS: &str = "vpa-tls-certs";

/// Secret holding the shoot's infrastructure credentials
pub const SECRET_NAME_CLOUD_PROVIDER: &str = "cloudprovider";

/// Kubeconfig of kube-proxy, rendered into the shoot-core bundle
pub const SECRET_NAME_KUBE_PROXY: &str = "kube-proxy";

/// Basic-auth credentials for operators of the logging stack
pub const SECRET_NAME_LOGGING_INGRESS: &str = "logging-ingress-credentials";

/// Secret of the VPA admission controller
pub const SECRET_NAME_VPA_ADMISSION_CONTROLLER: &str = "vpa-admission-controller";

/// Secret of the VPA recommender
pub const SECRET_NAME_VPA_RECOMMENDER: &str = "vpa-recommender";

/// Secret of the VPA updater
pub const SECRET_NAME_VPA_UPDATER: &str = "vpa-updater";

// ============================================================================
// Control-Plane Workloads
// ============================================================================

/// Name of the kube-apiserver deployment and service
pub const DEPLOYMENT_NAME_KUBE_APISERVER: &str = "kube-apiserver";

/// Name of the kube-controller-manager deployment
pub const DEPLOYMENT_NAME_KUBE_CONTROLLER_MANAGER: &str = "kube-controller-manager";

/// Name of the kube-scheduler deployment
pub const DEPLOYMENT_NAME_KUBE_SCHEDULER: &str = "kube-scheduler";

/// Main etcd cluster
pub const ETCD_MAIN: &str = "etcd-main";

/// Etcd cluster storing events
pub const ETCD_EVENTS: &str = "etcd-events";

/// Name of the in-cluster logging backend service
pub const ELASTICSEARCH_LOGGING: &str = "elasticsearch-logging";

/// Prefix of the API server domain below a cluster domain
pub const API_SERVER_DOMAIN_PREFIX: &str = "api";

// ============================================================================
// Ingress Host Prefixes
// ============================================================================

/// Host prefix of the alertmanager ingress
pub const INGRESS_PREFIX_ALERTMANAGER: &str = "au";

/// Host prefix of the operators' grafana ingress
pub const INGRESS_PREFIX_GRAFANA_OPERATORS: &str = "g-operators";

/// Host prefix of the users' grafana ingress
pub const INGRESS_PREFIX_GRAFANA_USERS: &str = "g-users";

/// Host prefix of the prometheus ingress
pub const INGRESS_PREFIX_PROMETHEUS: &str = "p";

/// Host prefix of the kibana ingress
pub const INGRESS_PREFIX_KIBANA: &str = "k";

// ============================================================================
// User Names
// ============================================================================

/// User embedded in the end-user kubeconfig
pub const USER_KUBECFG: &str = "system:cluster-admin";

/// User used to probe the kube-apiserver health
pub const USER_KUBE_APISERVER_HEALTH_CHECK: &str = "health-check";

/// User of the konnectivity-server
pub const USER_KONNECTIVITY_SERVER: &str = "system:konnectivity-server";

/// User of the dependency-watchdog probes
pub const USER_DEPENDENCY_WATCHDOG: &str = "gardener.cloud:system:dependency-watchdog";

/// User of the VPA admission controller
pub const USER_VPA_ADMISSION_CONTROLLER: &str = "gardener.cloud:vpa:admission-controller";

/// User of the VPA recommender
pub const USER_VPA_RECOMMENDER: &str = "gardener.cloud:vpa:recommender";

/// User of the VPA updater
pub const USER_VPA_UPDATER: &str = "gardener.cloud:vpa:updater";

// ============================================================================
// Secret Data Keys
// ============================================================================

/// CA certificate bundle
pub const DATA_KEY_CERTIFICATE_CA: &str = "ca.crt";

/// CA private key
pub const DATA_KEY_PRIVATE_KEY_CA: &str = "ca.key";

/// Leaf certificate
pub const DATA_KEY_CERTIFICATE: &str = "tls.crt";

/// Leaf private key
pub const DATA_KEY_PRIVATE_KEY: &str = "tls.key";

/// Kubeconfig document
pub const DATA_KEY_KUBECONFIG: &str = "kubeconfig";

/// Bearer token
pub const DATA_KEY_TOKEN: &str = "token";

/// Basic-auth user name
pub const DATA_KEY_USER_NAME: &str = "username";

/// Basic-auth password
pub const DATA_KEY_PASSWORD: &str = "password";

/// Basic-auth CSV consumed by the kube-apiserver
pub const DATA_KEY_CSV: &str = "basic_auth.csv";

/// Static token CSV consumed by the kube-apiserver
pub const DATA_KEY_STATIC_TOKEN_CSV: &str = "static_tokens.csv";

/// RSA private key
pub const DATA_KEY_RSA_PRIVATE_KEY: &str = "id_rsa";

/// OpenSSH public key
pub const DATA_KEY_SSH_AUTHORIZED_KEYS: &str = "id_rsa.pub";

/// OpenVPN static key
pub const DATA_KEY_VPN_TLS_AUTH: &str = "vpn.tlsauth";

/// OpenVPN Diffie-Hellman parameters
pub const DATA_KEY_DIFFIE_HELLMAN: &str = "dh2048.pem";

// ============================================================================
// Key and Credential Sizes
// ============================================================================

/// Bit length of certificate keys
pub const CERTIFICATE_KEY_BITS: usize = 2048;

/// Bit length of the SSH and service account keys
pub const LARGE_RSA_KEY_BITS: usize = 4096;

/// Length of generated passwords
pub const PASSWORD_LENGTH: usize = 32;

/// Length of generated static tokens
pub const STATIC_TOKEN_LENGTH: usize = 128;

/// Validity of CA certificates in days (10 years)
pub const CA_VALIDITY_DAYS: i64 = 3650;

/// Validity of leaf certificates in days (10 years)
pub const CERT_VALIDITY_DAYS: i64 = 3650;

/// Validity of certificates presented to end users in days (2 years)
pub const END_USER_CERT_VALIDITY_DAYS: i64 = 730;

// ============================================================================
// Managed Resources
// ============================================================================

/// Managed resource holding the shoot's core components
pub const MANAGED_RESOURCE_SHOOT_CORE: &str = "shoot-core";

/// Managed resource holding the shoot's core namespaces
pub const MANAGED_RESOURCE_CORE_NAMESPACES: &str = "shoot-core-namespaces";

/// Managed resource holding the optional addons
pub const MANAGED_RESOURCE_ADDONS: &str = "addons";

/// Managed resource holding the experimental kyma addon
pub const MANAGED_RESOURCE_KYMA: &str = "addons-kyma";

/// Managed resource holding the per-worker cloud-config execution scripts
pub const MANAGED_RESOURCE_CLOUD_CONFIG_EXECUTION: &str = "shoot-cloud-config-execution";

/// Chart providing shared RBAC for downloading cloud-config scripts
pub const CHART_CLOUD_CONFIG_RBAC: &str = "shoot-cloud-config-rbac";

/// Prefix of every secret referenced by a managed resource
pub const MANAGED_RESOURCE_SECRET_PREFIX: &str = "managedresource-";

/// Cloud-config secret created before secrets were labelled with their managed resource
pub const LEGACY_CLOUD_CONFIG_SECRET: &str = "managedresource-shoot-cloud-config-execution";

// ============================================================================
// Bootstrap Tokens
// ============================================================================

/// Description stored in generated bootstrap tokens
pub const BOOTSTRAP_TOKEN_DESCRIPTION: &str = "A bootstrap token generated by Gardener.";

/// Validity of bootstrap tokens in hours
pub const BOOTSTRAP_TOKEN_VALIDITY_HOURS: i64 = 48;

/// Secret type of bootstrap tokens
pub const BOOTSTRAP_TOKEN_SECRET_TYPE: &str = "bootstrap.kubernetes.io/token";

/// Prefix of bootstrap token secret names
pub const BOOTSTRAP_TOKEN_SECRET_PREFIX: &str = "bootstrap-token-";

/// Group of nodes joining via bootstrap tokens
pub const BOOTSTRAP_TOKEN_GROUP: &str = "system:bootstrappers:gardener";

// ============================================================================
// Conflict Retry
// ============================================================================

/// Number of attempts when updating an object hit by a conflict
pub const CONFLICT_RETRY_STEPS: u32 = 5;

/// Pause between conflict retries in milliseconds
pub const CONFLICT_RETRY_INTERVAL_MILLIS: u64 = 10;

/// Jitter applied to conflict retry pauses (±10%)
pub const CONFLICT_RETRY_JITTER: f64 = 0.1;

// ============================================================================
// Addons
// ============================================================================

/// Shoot purpose that disables the monitoring addons
pub const SHOOT_PURPOSE_TESTING: &str = "testing";

/// kube-proxy mode enabling IPVS
pub const PROXY_MODE_IPVS: &str = "IPVS";

/// Port of the seed-side SNI endpoint used by the apiserver proxy
pub const APISERVER_PROXY_PORT: u16 = 8443;

/// Project secret suffix of the kubeconfig
pub const PROJECT_SECRET_SUFFIX_KUBECONFIG: &str = "kubeconfig";

/// Project secret suffix of the monitoring credentials
pub const PROJECT_SECRET_SUFFIX_MONITORING: &str = "monitoring";

/// Project secret suffix of the logging credentials
pub const PROJECT_SECRET_SUFFIX_LOGGING: &str = "logging";

// ============================================================================
// Charts
// ============================================================================

/// Chart directory of the shoot's core components and namespaces
pub const CHART_SHOOT_CORE: &str = "shoot-core";

/// Chart directory of the optional addons
pub const CHART_SHOOT_ADDONS: &str = "shoot-addons";

/// Chart directory of the kyma addon
pub const CHART_SHOOT_ADDONS_KYMA: &str = "shoot-addons-kyma";

/// Chart directory of the per-worker cloud-config execution scripts
pub const CHART_CLOUD_CONFIG_EXECUTION: &str = "shoot-cloud-config-execution";

/// Namespace the kyma installer runs in
pub const NAMESPACE_KYMA_INSTALLER: &str = "kyma-installer";

// ============================================================================
// Images
// ============================================================================

pub const IMAGE_COREDNS: &str = "coredns";
pub const IMAGE_NODE_PROBLEM_DETECTOR: &str = "node-problem-detector";
pub const IMAGE_KUBE_PROXY: &str = "hyperkube";
pub const IMAGE_ALPINE: &str = "alpine";
pub const IMAGE_METRICS_SERVER: &str = "metrics-server";
pub const IMAGE_NODE_EXPORTER: &str = "node-exporter";
pub const IMAGE_BLACKBOX_EXPORTER: &str = "blackbox-exporter";
pub const IMAGE_APISERVER_PROXY: &str = "apiserver-proxy";
pub const IMAGE_APISERVER_PROXY_SIDECAR: &str = "apiserver-proxy-sidecar";
pub const IMAGE_KONNECTIVITY_AGENT: &str = "konnectivity-agent";
pub const IMAGE_VPN_SHOOT: &str = "vpn-shoot";
pub const IMAGE_KUBERNETES_DASHBOARD: &str = "kubernetes-dashboard";
pub const IMAGE_KUBERNETES_DASHBOARD_METRICS_SCRAPER: &str = "kubernetes-dashboard-metrics-scraper";
pub const IMAGE_NGINX_INGRESS_CONTROLLER: &str = "nginx-ingress-controller";
pub const IMAGE_INGRESS_DEFAULT_BACKEND: &str = "ingress-default-backend";
