// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The catalog of secrets a shoot control plane needs.
//!
//! Certificate authorities, the static token and the API-server basic-auth
//! credentials are produced first by the secrets manager. Everything else is
//! listed by [`generate_wanted_secret_configs`], which runs once tokens and
//! credentials are known so they can be embedded into kubeconfigs.

use super::shoot::{api_server_domain, ShootContext};
use crate::constants::{
    DEFAULT_DOMAIN, DEPLOYMENT_NAME_KUBE_CONTROLLER_MANAGER, DEPLOYMENT_NAME_KUBE_SCHEDULER,
    ELASTICSEARCH_LOGGING, END_USER_CERT_VALIDITY_DAYS, ETCD_EVENTS, ETCD_MAIN, GARDENER_NAME,
    LARGE_RSA_KEY_BITS, NAMESPACE_KUBE_SYSTEM, PASSWORD_LENGTH, SECRET_NAME_ALERTMANAGER_TLS,
    SECRET_NAME_BASIC_AUTH, SECRET_NAME_CA_CLUSTER, SECRET_NAME_CA_ETCD,
    SECRET_NAME_CA_FRONT_PROXY, SECRET_NAME_CA_KUBELET, SECRET_NAME_CA_METRICS_SERVER,
    SECRET_NAME_CLUSTER_AUTOSCALER, SECRET_NAME_DEPENDENCY_WATCHDOG_EXTERNAL_PROBE,
    SECRET_NAME_DEPENDENCY_WATCHDOG_INTERNAL_PROBE, SECRET_NAME_ETCD_CLIENT_TLS,
    SECRET_NAME_ETCD_SERVER_TLS, SECRET_NAME_GARDENER, SECRET_NAME_GARDENER_INTERNAL,
    SECRET_NAME_GRAFANA_TLS, SECRET_NAME_KIBANA_TLS, SECRET_NAME_KONNECTIVITY_SERVER,
    SECRET_NAME_KONNECTIVITY_SERVER_KUBECONFIG, SECRET_NAME_KUBECFG, SECRET_NAME_KUBE_APISERVER,
    SECRET_NAME_KUBE_CONTROLLER_MANAGER_SERVER, SECRET_NAME_KUBE_PROXY,
    SECRET_NAME_KUBE_SCHEDULER_SERVER, SECRET_NAME_LOGGING_INGRESS,
    SECRET_NAME_LOGGING_INGRESS_USERS, SECRET_NAME_METRICS_SERVER,
    SECRET_NAME_MONITORING_INGRESS, SECRET_NAME_MONITORING_INGRESS_USERS,
    SECRET_NAME_PROMETHEUS_TLS, SECRET_NAME_SERVICE_ACCOUNT_KEY, SECRET_NAME_SSH_KEYPAIR,
    SECRET_NAME_STATIC_TOKEN, SECRET_NAME_VPA_ADMISSION_CONTROLLER, SECRET_NAME_VPA_RECOMMENDER,
    SECRET_NAME_VPA_TLS_CERTS, SECRET_NAME_VPA_UPDATER, SECRET_NAME_VPN_SEED,
    SECRET_NAME_VPN_SEED_TLS_AUTH, SECRET_NAME_VPN_SHOOT, SYSTEM_PRIVILEGED_GROUP,
    USER_DEPENDENCY_WATCHDOG, USER_KONNECTIVITY_SERVER, USER_KUBECFG,
    USER_KUBE_APISERVER_HEALTH_CHECK, USER_VPA_ADMISSION_CONTROLLER, USER_VPA_RECOMMENDER,
    USER_VPA_UPDATER,
};
use crate::errors::SecretsError;
use crate::secrets::config::{
    BasicAuthConfig, BasicAuthFormat, CertType, CertificateConfig, ControlPlaneConfig,
    PkcsEncoding, RsaConfig, SecretConfig, StaticTokenConfig, TokenConfig, VpnTlsAuthConfig,
};
use crate::secrets::credentials::{BasicAuth, StaticToken, Token};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};

/// VPA component secrets and the static-token user each one carries.
pub const VPA_SECRETS: [(&str, &str); 3] = [
    (SECRET_NAME_VPA_ADMISSION_CONTROLLER, USER_VPA_ADMISSION_CONTROLLER),
    (SECRET_NAME_VPA_RECOMMENDER, USER_VPA_RECOMMENDER),
    (SECRET_NAME_VPA_UPDATER, USER_VPA_UPDATER),
];

/// Organization of the monitoring clients
const ORG_MONITORING: &str = "gardener.cloud:monitoring";

/// Organization of the monitoring ingress certificates
const ORG_MONITORING_INGRESS: &str = "gardener.cloud:monitoring:ingress";

/// Organization of the logging ingress certificates
const ORG_LOGGING_INGRESS: &str = "gardener.cloud:logging:ingress";

/// `[name, name.ns, name.ns.svc, name.ns.svc.cluster.local]`
#[must_use]
pub fn dns_names_for_service(name: &str, namespace: &str) -> Vec<String> {
    vec![
        name.to_string(),
        format!("{name}.{namespace}"),
        format!("{name}.{namespace}.svc"),
        format!("{name}.{namespace}.svc.{DEFAULT_DOMAIN}"),
    ]
}

/// Local etcd names followed by the service names of both etcd clients.
#[must_use]
pub fn dns_names_for_etcd(namespace: &str) -> Vec<String> {
    let mut names = vec![format!("{ETCD_MAIN}-local"), format!("{ETCD_EVENTS}-local")];
    names.extend(dns_names_for_service(&format!("{ETCD_MAIN}-client"), namespace));
    names.extend(dns_names_for_service(&format!("{ETCD_EVENTS}-client"), namespace));
    names
}

/// The five certificate authorities of a shoot.
#[must_use]
pub fn wanted_certificate_authorities() -> Vec<CertificateConfig> {
    vec![
        CertificateConfig::ca(SECRET_NAME_CA_CLUSTER, "kubernetes"),
        CertificateConfig::ca(SECRET_NAME_CA_ETCD, "etcd"),
        CertificateConfig::ca(SECRET_NAME_CA_FRONT_PROXY, "front-proxy"),
        CertificateConfig::ca(SECRET_NAME_CA_KUBELET, "kubelet"),
        CertificateConfig::ca(SECRET_NAME_CA_METRICS_SERVER, "metrics-server"),
    ]
}

/// CSV credentials of the kube-apiserver admin user.
#[must_use]
pub fn basic_auth_secret_api_server() -> BasicAuthConfig {
    BasicAuthConfig {
        name: SECRET_NAME_BASIC_AUTH.to_string(),
        format: BasicAuthFormat::Csv,
        username: "admin".to_string(),
        password_length: PASSWORD_LENGTH,
    }
}

fn token_config(username: &str, user_id: &str, groups: &[&str]) -> TokenConfig {
    TokenConfig {
        username: username.to_string(),
        user_id: user_id.to_string(),
        groups: groups.iter().map(|g| (*g).to_string()).collect(),
    }
}

/// Identities that authenticate with a static token.
#[must_use]
pub fn generate_static_token_config(shoot: &ShootContext) -> StaticTokenConfig {
    let mut tokens = BTreeMap::from([
        (
            USER_KUBECFG.to_string(),
            token_config(USER_KUBECFG, USER_KUBECFG, &[SYSTEM_PRIVILEGED_GROUP]),
        ),
        (
            USER_KUBE_APISERVER_HEALTH_CHECK.to_string(),
            token_config(
                USER_KUBE_APISERVER_HEALTH_CHECK,
                USER_KUBE_APISERVER_HEALTH_CHECK,
                &[],
            ),
        ),
    ]);

    if shoot.konnectivity_tunnel_enabled {
        tokens.insert(
            USER_KONNECTIVITY_SERVER.to_string(),
            token_config(USER_KONNECTIVITY_SERVER, USER_KONNECTIVITY_SERVER, &[]),
        );
    }

    if shoot.wants_vertical_pod_autoscaler {
        for (secret_name, username) in VPA_SECRETS {
            tokens.insert(
                secret_name.to_string(),
                token_config(username, secret_name, &[]),
            );
        }
    }

    StaticTokenConfig {
        name: SECRET_NAME_STATIC_TOKEN.to_string(),
        tokens,
    }
}

fn token_for(static_token: Option<&StaticToken>, username: &str) -> Result<Option<Token>, SecretsError> {
    static_token
        .map(|st| st.get_token_for_username(username).cloned())
        .transpose()
}

fn client_cert(name: &str, common_name: &str, signing_ca: &str) -> CertificateConfig {
    CertificateConfig::signed(name, common_name, CertType::Client, signing_ca)
}

fn server_cert(name: &str, common_name: &str, signing_ca: &str) -> CertificateConfig {
    CertificateConfig::signed(name, common_name, CertType::Server, signing_ca)
}

fn control_plane(certificate: CertificateConfig) -> ControlPlaneConfig {
    ControlPlaneConfig::new(certificate)
}

fn api_server_sans(shoot: &ShootContext) -> (Vec<String>, Vec<IpAddr>) {
    let ns = &shoot.seed_namespace;
    let mut ip_addresses = vec![IpAddr::V4(Ipv4Addr::LOCALHOST), shoot.networks.api_server];
    let mut dns_names = vec![
        "kube-apiserver".to_string(),
        format!("kube-apiserver.{ns}"),
        format!("kube-apiserver.{ns}.svc"),
        api_server_domain(&shoot.internal_cluster_domain),
    ];
    dns_names.extend(dns_names_for_service("kubernetes", "default"));

    if !shoot.seed_shoot_dns_enabled {
        match shoot.api_server_address.parse::<IpAddr>() {
            Ok(address) => ip_addresses.push(address),
            Err(_) => dns_names.push(shoot.api_server_address.clone()),
        }
    }

    if let Some(external) = &shoot.external_cluster_domain {
        dns_names.push(external.clone());
        dns_names.push(api_server_domain(external));
    }

    (dns_names, ip_addresses)
}

/// Every secret of the control plane besides the CAs, the static token and
/// the API-server basic auth.
///
/// The order is stable for identical input.
///
/// # Errors
///
/// Returns [`SecretsError::MissingToken`] if `static_token` is present but
/// lacks a token that a kubeconfig must embed.
pub fn generate_wanted_secret_configs(
    shoot: &ShootContext,
    basic_auth_api_server: Option<&BasicAuth>,
    static_token: Option<&StaticToken>,
) -> Result<Vec<SecretConfig>, SecretsError> {
    let ns = shoot.seed_namespace.as_str();
    let in_cluster = shoot.compute_in_cluster_api_server_address(true);
    let in_cluster_other_ns = shoot.compute_in_cluster_api_server_address(false);
    let out_of_cluster_internal = shoot.compute_out_of_cluster_api_server_address(true);
    let out_of_cluster_external = shoot.compute_out_of_cluster_api_server_address(false);
    let (api_server_dns_names, api_server_ip_addresses) = api_server_sans(shoot);

    let mut secrets = vec![
        SecretConfig::ControlPlane(control_plane(
            server_cert(SECRET_NAME_KUBE_APISERVER, "kube-apiserver", SECRET_NAME_CA_CLUSTER)
                .with_dns_names(api_server_dns_names)
                .with_ip_addresses(api_server_ip_addresses),
        )),
        SecretConfig::ControlPlane(control_plane(client_cert(
            "kube-apiserver-kubelet",
            "system:kube-apiserver:kubelet",
            SECRET_NAME_CA_KUBELET,
        ))),
        SecretConfig::ControlPlane(control_plane(client_cert(
            "kube-aggregator",
            "system:kube-aggregator",
            SECRET_NAME_CA_FRONT_PROXY,
        ))),
        SecretConfig::ControlPlane(
            control_plane(client_cert(
                "kube-controller-manager",
                "system:kube-controller-manager",
                SECRET_NAME_CA_CLUSTER,
            ))
            .with_kubeconfig(ns, &in_cluster),
        ),
        SecretConfig::ControlPlane(control_plane(
            server_cert(
                SECRET_NAME_KUBE_CONTROLLER_MANAGER_SERVER,
                DEPLOYMENT_NAME_KUBE_CONTROLLER_MANAGER,
                SECRET_NAME_CA_CLUSTER,
            )
            .with_dns_names(dns_names_for_service(DEPLOYMENT_NAME_KUBE_CONTROLLER_MANAGER, ns)),
        )),
        SecretConfig::ControlPlane(
            control_plane(client_cert(
                "kube-scheduler",
                "system:kube-scheduler",
                SECRET_NAME_CA_CLUSTER,
            ))
            .with_kubeconfig(ns, &in_cluster),
        ),
        SecretConfig::ControlPlane(control_plane(
            server_cert(
                SECRET_NAME_KUBE_SCHEDULER_SERVER,
                DEPLOYMENT_NAME_KUBE_SCHEDULER,
                SECRET_NAME_CA_CLUSTER,
            )
            .with_dns_names(dns_names_for_service(DEPLOYMENT_NAME_KUBE_SCHEDULER, ns)),
        )),
        SecretConfig::ControlPlane(
            control_plane(client_cert(
                SECRET_NAME_CLUSTER_AUTOSCALER,
                "system:cluster-autoscaler",
                SECRET_NAME_CA_CLUSTER,
            ))
            .with_kubeconfig(ns, &in_cluster),
        ),
        SecretConfig::ControlPlane(
            control_plane(
                client_cert(
                    "gardener-resource-manager",
                    "gardener.cloud:system:gardener-resource-manager",
                    SECRET_NAME_CA_CLUSTER,
                )
                .with_organization(SYSTEM_PRIVILEGED_GROUP),
            )
            .with_kubeconfig(ns, &in_cluster),
        ),
        SecretConfig::ControlPlane(
            control_plane(client_cert(
                SECRET_NAME_KUBE_PROXY,
                "system:kube-proxy",
                SECRET_NAME_CA_CLUSTER,
            ))
            .with_kubeconfig(ns, &out_of_cluster_internal),
        ),
        SecretConfig::ControlPlane(
            control_plane(
                client_cert(
                    "kube-state-metrics",
                    "gardener.cloud:monitoring:kube-state-metrics",
                    SECRET_NAME_CA_CLUSTER,
                )
                .with_organization(ORG_MONITORING),
            )
            .with_kubeconfig(ns, &in_cluster),
        ),
        SecretConfig::ControlPlane(
            control_plane(
                client_cert(
                    "prometheus",
                    "gardener.cloud:monitoring:prometheus",
                    SECRET_NAME_CA_CLUSTER,
                )
                .with_organization(ORG_MONITORING),
            )
            .with_kubeconfig(ns, &in_cluster),
        ),
        SecretConfig::ControlPlane(control_plane(
            client_cert(
                "prometheus-kubelet",
                "gardener.cloud:monitoring:prometheus",
                SECRET_NAME_CA_KUBELET,
            )
            .with_organization(ORG_MONITORING),
        )),
        SecretConfig::ControlPlane(
            control_plane(
                client_cert(SECRET_NAME_GARDENER, GARDENER_NAME, SECRET_NAME_CA_CLUSTER)
                    .with_organization(SYSTEM_PRIVILEGED_GROUP),
            )
            .with_kubeconfig(ns, &out_of_cluster_internal),
        ),
        SecretConfig::ControlPlane(
            control_plane(
                client_cert(SECRET_NAME_GARDENER_INTERNAL, GARDENER_NAME, SECRET_NAME_CA_CLUSTER)
                    .with_organization(SYSTEM_PRIVILEGED_GROUP),
            )
            .with_kubeconfig(ns, &in_cluster_other_ns),
        ),
        SecretConfig::ControlPlane(
            control_plane(client_cert(
                "cloud-config-downloader",
                "cloud-config-downloader",
                SECRET_NAME_CA_CLUSTER,
            ))
            .with_kubeconfig(ns, &out_of_cluster_internal),
        ),
        SecretConfig::BasicAuth(BasicAuthConfig::normal(
            SECRET_NAME_MONITORING_INGRESS,
            "admin",
            PASSWORD_LENGTH,
        )),
        SecretConfig::BasicAuth(BasicAuthConfig::normal(
            SECRET_NAME_MONITORING_INGRESS_USERS,
            "admin",
            PASSWORD_LENGTH,
        )),
        SecretConfig::Rsa(RsaConfig {
            name: SECRET_NAME_SSH_KEYPAIR.to_string(),
            bits: LARGE_RSA_KEY_BITS,
            used_for_ssh: true,
        }),
        SecretConfig::Rsa(RsaConfig {
            name: SECRET_NAME_SERVICE_ACCOUNT_KEY.to_string(),
            bits: LARGE_RSA_KEY_BITS,
            used_for_ssh: false,
        }),
        SecretConfig::Certificate(
            CertificateConfig::signed(
                SECRET_NAME_ETCD_SERVER_TLS,
                "etcd-server",
                CertType::ServerClient,
                SECRET_NAME_CA_ETCD,
            )
            .with_dns_names(dns_names_for_etcd(ns)),
        ),
        SecretConfig::Certificate(client_cert(
            SECRET_NAME_ETCD_CLIENT_TLS,
            "etcd-client",
            SECRET_NAME_CA_ETCD,
        )),
        SecretConfig::Certificate(
            CertificateConfig::signed(
                SECRET_NAME_METRICS_SERVER,
                "metrics-server",
                CertType::ServerClient,
                SECRET_NAME_CA_METRICS_SERVER,
            )
            .with_dns_names(vec![
                "metrics-server".to_string(),
                format!("metrics-server.{NAMESPACE_KUBE_SYSTEM}"),
                format!("metrics-server.{NAMESPACE_KUBE_SYSTEM}.svc"),
            ]),
        ),
        SecretConfig::Certificate(
            server_cert(SECRET_NAME_ALERTMANAGER_TLS, "alertmanager", SECRET_NAME_CA_CLUSTER)
                .with_organization(ORG_MONITORING_INGRESS)
                .with_dns_names(shoot.alertmanager_hosts())
                .with_validity_days(END_USER_CERT_VALIDITY_DAYS),
        ),
        SecretConfig::Certificate(
            server_cert(SECRET_NAME_GRAFANA_TLS, "grafana", SECRET_NAME_CA_CLUSTER)
                .with_organization(ORG_MONITORING_INGRESS)
                .with_dns_names(shoot.grafana_hosts())
                .with_validity_days(END_USER_CERT_VALIDITY_DAYS),
        ),
        SecretConfig::Certificate(
            server_cert(SECRET_NAME_PROMETHEUS_TLS, "prometheus", SECRET_NAME_CA_CLUSTER)
                .with_organization(ORG_MONITORING_INGRESS)
                .with_dns_names(shoot.prometheus_hosts())
                .with_validity_days(END_USER_CERT_VALIDITY_DAYS),
        ),
    ];

    // The end-user kubeconfig carries no client certificate, only credentials.
    secrets.push(SecretConfig::ControlPlane(
        control_plane(client_cert(SECRET_NAME_KUBECFG, "", SECRET_NAME_CA_CLUSTER))
            .with_basic_auth(basic_auth_api_server.cloned())
            .with_token(token_for(static_token, USER_KUBECFG)?)
            .with_kubeconfig(ns, &out_of_cluster_external),
    ));

    secrets.push(SecretConfig::ControlPlane(
        control_plane(client_cert(
            SECRET_NAME_DEPENDENCY_WATCHDOG_INTERNAL_PROBE,
            USER_DEPENDENCY_WATCHDOG,
            SECRET_NAME_CA_CLUSTER,
        ))
        .with_kubeconfig(ns, &in_cluster_other_ns),
    ));
    secrets.push(SecretConfig::ControlPlane(
        control_plane(client_cert(
            SECRET_NAME_DEPENDENCY_WATCHDOG_EXTERNAL_PROBE,
            USER_DEPENDENCY_WATCHDOG,
            SECRET_NAME_CA_CLUSTER,
        ))
        .with_kubeconfig(ns, &out_of_cluster_internal),
    ));

    if shoot.konnectivity_tunnel_enabled {
        let mut konnectivity_dns_names = vec![api_server_domain(&shoot.internal_cluster_domain)];
        konnectivity_dns_names.extend(dns_names_for_service(SECRET_NAME_KONNECTIVITY_SERVER, ns));

        secrets.push(SecretConfig::ControlPlane(
            control_plane(client_cert(
                SECRET_NAME_KONNECTIVITY_SERVER_KUBECONFIG,
                "",
                SECRET_NAME_CA_CLUSTER,
            ))
            .with_basic_auth(basic_auth_api_server.cloned())
            .with_token(token_for(static_token, USER_KONNECTIVITY_SERVER)?)
            .with_kubeconfig(ns, &format!("kube-apiserver.{ns}")),
        ));
        secrets.push(SecretConfig::ControlPlane(control_plane(
            server_cert(
                SECRET_NAME_KONNECTIVITY_SERVER,
                SECRET_NAME_KONNECTIVITY_SERVER,
                SECRET_NAME_CA_CLUSTER,
            )
            .with_dns_names(konnectivity_dns_names),
        )));
    } else {
        secrets.push(SecretConfig::Certificate(server_cert(
            SECRET_NAME_VPN_SHOOT,
            SECRET_NAME_VPN_SHOOT,
            SECRET_NAME_CA_CLUSTER,
        )));
        secrets.push(SecretConfig::Certificate(client_cert(
            SECRET_NAME_VPN_SEED,
            SECRET_NAME_VPN_SEED,
            SECRET_NAME_CA_CLUSTER,
        )));
        secrets.push(SecretConfig::VpnTlsAuth(VpnTlsAuthConfig {
            name: SECRET_NAME_VPN_SEED_TLS_AUTH.to_string(),
        }));
    }

    if shoot.logging_enabled {
        secrets.extend(logging_secrets(shoot));
    }

    if shoot.wants_vertical_pod_autoscaler {
        let common_name = format!("vpa-webhook.{ns}.svc");
        secrets.push(SecretConfig::Certificate(
            server_cert(SECRET_NAME_VPA_TLS_CERTS, &common_name, SECRET_NAME_CA_CLUSTER)
                .with_dns_names(vec![
                    "vpa-webhook".to_string(),
                    format!("vpa-webhook.{ns}"),
                    common_name.clone(),
                ]),
        ));
    }

    Ok(secrets)
}

fn logging_secrets(shoot: &ShootContext) -> Vec<SecretConfig> {
    let ns = &shoot.seed_namespace;
    let elasticsearch_hosts = vec![
        ELASTICSEARCH_LOGGING.to_string(),
        format!("{ELASTICSEARCH_LOGGING}.{ns}"),
        format!("{ELASTICSEARCH_LOGGING}.{ns}.svc"),
    ];

    vec![
        SecretConfig::Certificate(
            server_cert(SECRET_NAME_KIBANA_TLS, "kibana", SECRET_NAME_CA_CLUSTER)
                .with_organization(ORG_LOGGING_INGRESS)
                .with_dns_names(vec![shoot.kibana_host()])
                .with_validity_days(END_USER_CERT_VALIDITY_DAYS),
        ),
        SecretConfig::Certificate(
            CertificateConfig::signed(
                "elasticsearch-logging-server",
                "elasticsearch",
                CertType::ServerClient,
                SECRET_NAME_CA_CLUSTER,
            )
            .with_dns_names(elasticsearch_hosts.clone())
            .with_pkcs(PkcsEncoding::Pkcs8),
        ),
        SecretConfig::BasicAuth(BasicAuthConfig::normal(
            SECRET_NAME_LOGGING_INGRESS_USERS,
            "user",
            PASSWORD_LENGTH,
        )),
        SecretConfig::BasicAuth(BasicAuthConfig::normal(
            SECRET_NAME_LOGGING_INGRESS,
            "admin",
            PASSWORD_LENGTH,
        )),
        SecretConfig::Certificate(
            client_cert("sg-admin-client", ELASTICSEARCH_LOGGING, SECRET_NAME_CA_CLUSTER)
                .with_dns_names(elasticsearch_hosts)
                .with_pkcs(PkcsEncoding::Pkcs8),
        ),
        SecretConfig::BasicAuth(BasicAuthConfig::normal(
            "kibana-logging-sg-credentials",
            "kibanaserver",
            PASSWORD_LENGTH,
        )),
        SecretConfig::BasicAuth(BasicAuthConfig::normal(
            "curator-sg-credentials",
            "curator",
            PASSWORD_LENGTH,
        )),
        SecretConfig::BasicAuth(BasicAuthConfig::normal(
            "admin-sg-credentials",
            "admin",
            PASSWORD_LENGTH,
        )),
    ]
}

#[cfg(test)]
#[path = "wanted_secrets_tests.rs"]
mod wanted_secrets_tests;
