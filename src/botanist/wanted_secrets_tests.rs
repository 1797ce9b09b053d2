// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `wanted_secrets.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::botanist::fixtures::{self, context, context_with, shoot};
    use crate::config::BotanistConfig;
    use crate::secrets::config::KubeconfigRequest;

    fn names(configs: &[SecretConfig]) -> Vec<String> {
        configs.iter().map(|c| c.name().to_string()).collect()
    }

    fn find<'a>(configs: &'a [SecretConfig], name: &str) -> &'a SecretConfig {
        configs
            .iter()
            .find(|c| c.name() == name)
            .unwrap_or_else(|| panic!("secret config {name} not found"))
    }

    fn certificate<'a>(configs: &'a [SecretConfig], name: &str) -> &'a CertificateConfig {
        match find(configs, name) {
            SecretConfig::Certificate(cert) => cert,
            SecretConfig::ControlPlane(cp) => &cp.certificate,
            other => panic!("{name} is a {}", other.kind()),
        }
    }

    fn kubeconfig<'a>(configs: &'a [SecretConfig], name: &str) -> &'a KubeconfigRequest {
        match find(configs, name) {
            SecretConfig::ControlPlane(cp) => cp
                .kubeconfig_request
                .as_ref()
                .unwrap_or_else(|| panic!("{name} has no kubeconfig")),
            other => panic!("{name} is a {}", other.kind()),
        }
    }

    fn static_token_for(ctx: &ShootContext) -> StaticToken {
        StaticToken::generate(&generate_static_token_config(ctx))
    }

    #[test]
    fn test_dns_names_for_service() {
        assert_eq!(
            dns_names_for_service("kube-scheduler", "shoot--dev--local"),
            vec![
                "kube-scheduler".to_string(),
                "kube-scheduler.shoot--dev--local".to_string(),
                "kube-scheduler.shoot--dev--local.svc".to_string(),
                "kube-scheduler.shoot--dev--local.svc.cluster.local".to_string(),
            ]
        );
    }

    #[test]
    fn test_dns_names_for_etcd() {
        let names = dns_names_for_etcd("ns");
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "etcd-main-local");
        assert_eq!(names[1], "etcd-events-local");
        assert!(names.contains(&"etcd-main-client.ns.svc".to_string()));
        assert!(names.contains(&"etcd-events-client.ns.svc.cluster.local".to_string()));
    }

    #[test]
    fn test_certificate_authorities() {
        let cas = wanted_certificate_authorities();
        let names: Vec<&str> = cas.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["ca", "ca-etcd", "ca-front-proxy", "ca-kubelet", "ca-metrics-server"]
        );
        assert!(cas.iter().all(|c| c.cert_type == CertType::Ca));
    }

    #[test]
    fn test_static_token_config_base_users() {
        let config = generate_static_token_config(&context());
        let keys: Vec<&str> = config.tokens.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![USER_KUBE_APISERVER_HEALTH_CHECK, USER_KUBECFG]);
        assert_eq!(config.tokens[USER_KUBECFG].groups, vec!["system:masters".to_string()]);
    }

    #[test]
    fn test_static_token_config_optional_users() {
        let mut ctx = context();
        ctx.konnectivity_tunnel_enabled = true;
        ctx.wants_vertical_pod_autoscaler = true;

        let tokens = generate_static_token_config(&ctx).tokens;
        assert!(tokens.contains_key(USER_KONNECTIVITY_SERVER));
        for (secret_name, username) in VPA_SECRETS {
            assert_eq!(tokens[secret_name].username, username);
        }
    }

    #[test]
    fn test_default_catalog_uses_vpn_tunnel() {
        let ctx = context();
        let configs = generate_wanted_secret_configs(&ctx, None, None).unwrap();
        let names = names(&configs);

        for expected in ["vpn-shoot", "vpn-seed", "vpn-seed-tlsauth", "kubecfg", "ssh-keypair"] {
            assert!(names.contains(&expected.to_string()), "{expected} missing");
        }
        for unexpected in [
            "konnectivity-server",
            "konnectivity-server-kubeconfig",
            "vpa-tls-certs",
            "kibana-tls",
            "logging-ingress-credentials",
        ] {
            assert!(!names.contains(&unexpected.to_string()), "{unexpected} present");
        }
    }

    #[test]
    fn test_konnectivity_replaces_vpn() {
        let mut ctx = context();
        ctx.konnectivity_tunnel_enabled = true;
        let static_token = static_token_for(&ctx);

        let configs = generate_wanted_secret_configs(&ctx, None, Some(&static_token)).unwrap();
        let names = names(&configs);

        assert!(names.contains(&"konnectivity-server".to_string()));
        assert!(names.contains(&"konnectivity-server-kubeconfig".to_string()));
        assert!(!names.contains(&"vpn-shoot".to_string()));
        assert!(!names.contains(&"vpn-seed-tlsauth".to_string()));
        assert_eq!(
            kubeconfig(&configs, "konnectivity-server-kubeconfig").api_server_url,
            "kube-apiserver.shoot--dev--local"
        );
    }

    #[test]
    fn test_logging_and_vpa_secrets() {
        let mut ctx = context();
        ctx.logging_enabled = true;
        ctx.wants_vertical_pod_autoscaler = true;

        let configs = generate_wanted_secret_configs(&ctx, None, None).unwrap();

        let kibana = certificate(&configs, "kibana-tls");
        assert_eq!(kibana.dns_names, vec![ctx.kibana_host()]);
        assert_eq!(kibana.validity_days, Some(END_USER_CERT_VALIDITY_DAYS));

        let elasticsearch = certificate(&configs, "elasticsearch-logging-server");
        assert_eq!(elasticsearch.pkcs, PkcsEncoding::Pkcs8);
        assert_eq!(elasticsearch.cert_type, CertType::ServerClient);

        let vpa = certificate(&configs, "vpa-tls-certs");
        assert_eq!(vpa.common_name, "vpa-webhook.shoot--dev--local.svc");
        assert_eq!(vpa.dns_names.len(), 3);
    }

    #[test]
    fn test_missing_kubecfg_token_is_an_error() {
        let static_token = StaticToken {
            name: "static-token".to_string(),
            tokens: vec![],
        };

        let err = generate_wanted_secret_configs(&context(), None, Some(&static_token)).unwrap_err();

        assert_eq!(
            err,
            SecretsError::MissingToken {
                secret: "static-token".to_string(),
                username: USER_KUBECFG.to_string(),
            }
        );
    }

    #[test]
    fn test_kubecfg_embeds_credentials() {
        let ctx = context();
        let static_token = static_token_for(&ctx);
        let basic_auth = BasicAuth::generate(&basic_auth_secret_api_server());

        let configs =
            generate_wanted_secret_configs(&ctx, Some(&basic_auth), Some(&static_token)).unwrap();

        match find(&configs, "kubecfg") {
            SecretConfig::ControlPlane(cp) => {
                assert_eq!(cp.basic_auth.as_ref(), Some(&basic_auth));
                assert_eq!(
                    cp.token.as_ref().map(|t| t.username.as_str()),
                    Some(USER_KUBECFG)
                );
                assert!(cp.certificate.common_name.is_empty());
            }
            other => panic!("kubecfg is a {}", other.kind()),
        }
        assert_eq!(
            kubeconfig(&configs, "kubecfg").api_server_url,
            "api.local.dev.example.com"
        );
    }

    #[test]
    fn test_api_server_sans() {
        let configs = generate_wanted_secret_configs(&context(), None, None).unwrap();
        let cert = certificate(&configs, "kube-apiserver");

        assert_eq!(
            cert.ip_addresses,
            vec![
                "127.0.0.1".parse::<IpAddr>().unwrap(),
                "100.64.0.1".parse::<IpAddr>().unwrap(),
            ]
        );
        for name in [
            "kube-apiserver",
            "kube-apiserver.shoot--dev--local.svc",
            "api.local.dev.internal.example.com",
            "kubernetes.default.svc.cluster.local",
            "local.dev.example.com",
            "api.local.dev.example.com",
        ] {
            assert!(cert.dns_names.contains(&name.to_string()), "{name} missing");
        }
    }

    #[test]
    fn test_api_server_address_added_without_shoot_dns() {
        let config = BotanistConfig {
            seed_shoot_dns_enabled: false,
            ..fixtures::config()
        };
        let configs =
            generate_wanted_secret_configs(&context_with(shoot(), &config), None, None).unwrap();
        let cert = certificate(&configs, "kube-apiserver");
        assert!(cert
            .ip_addresses
            .contains(&"1.2.3.4".parse::<IpAddr>().unwrap()));

        let mut ctx = context_with(shoot(), &config);
        ctx.api_server_address = "lb.example.com".to_string();
        let configs = generate_wanted_secret_configs(&ctx, None, None).unwrap();
        assert!(certificate(&configs, "kube-apiserver")
            .dns_names
            .contains(&"lb.example.com".to_string()));
    }

    #[test]
    fn test_catalog_is_deterministic() {
        let ctx = context();
        let first = generate_wanted_secret_configs(&ctx, None, None).unwrap();
        let second = generate_wanted_secret_configs(&ctx, None, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_in_cluster_kubeconfigs() {
        let configs = generate_wanted_secret_configs(&context(), None, None).unwrap();
        assert_eq!(
            kubeconfig(&configs, "kube-scheduler").api_server_url,
            "kube-apiserver"
        );
        assert_eq!(
            kubeconfig(&configs, "gardener-internal").api_server_url,
            "kube-apiserver.shoot--dev--local.svc"
        );
        assert_eq!(
            kubeconfig(&configs, "kube-proxy").api_server_url,
            "api.local.dev.internal.example.com"
        );
    }
}
