// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `shoot.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::botanist::fixtures::{self, context, context_with, shoot};
    use crate::crd::{KubeApiServerConfig, KubeProxyConfig, ShootStatus};
    use std::collections::BTreeMap;

    #[test]
    fn test_nth_address() {
        assert_eq!(
            nth_address("100.64.0.0/13", 1).unwrap(),
            "100.64.0.1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            nth_address("100.64.3.7/13", 10).unwrap(),
            "100.64.0.10".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            nth_address("fd00:10::/112", 10).unwrap(),
            "fd00:10::a".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_nth_address_rejects_bad_input() {
        assert!(matches!(
            nth_address("100.64.0.0", 1),
            Err(ShootError::InvalidCidr { .. })
        ));
        assert!(matches!(
            nth_address("100.64.0.0/33", 1),
            Err(ShootError::InvalidCidr { .. })
        ));
        assert!(matches!(
            nth_address("10.0.0.0/30", 10),
            Err(ShootError::InvalidCidr { .. })
        ));
    }

    #[test]
    fn test_networks_from_shoot() {
        let ctx = context();
        assert_eq!(ctx.networks.api_server, "100.64.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(ctx.networks.core_dns, "100.64.0.10".parse::<IpAddr>().unwrap());
        assert_eq!(ctx.networks.pods.as_deref(), Some("100.96.0.0/11"));
    }

    #[test]
    fn test_missing_service_network() {
        let mut shoot = shoot();
        shoot.spec.networking.services = None;

        let err = ShootContext::new(
            shoot,
            fixtures::PROJECT,
            fixtures::INTERNAL_DOMAIN,
            fixtures::API_SERVER_ADDRESS,
            &fixtures::config(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ShootError::MissingNetwork {
                shoot: "local".to_string(),
                network: "services".to_string(),
            }
        );
    }

    #[test]
    fn test_seed_namespace_prefers_technical_id() {
        assert_eq!(context().seed_namespace, "shoot--dev--local");

        let mut shoot = shoot();
        shoot.status = Some(ShootStatus {
            technical_id: Some("shoot--dev--renamed".to_string()),
            ..ShootStatus::default()
        });
        assert_eq!(
            context_with(shoot, &fixtures::config()).seed_namespace,
            "shoot--dev--renamed"
        );
    }

    #[test]
    fn test_api_server_addresses() {
        let ctx = context();
        assert_eq!(ctx.compute_in_cluster_api_server_address(true), "kube-apiserver");
        assert_eq!(
            ctx.compute_in_cluster_api_server_address(false),
            "kube-apiserver.shoot--dev--local.svc"
        );
        assert_eq!(
            ctx.compute_out_of_cluster_api_server_address(true),
            "api.local.dev.internal.example.com"
        );
        assert_eq!(
            ctx.compute_out_of_cluster_api_server_address(false),
            "api.local.dev.example.com"
        );
    }

    #[test]
    fn test_out_of_cluster_address_without_shoot_dns() {
        let config = BotanistConfig {
            seed_shoot_dns_enabled: false,
            ..fixtures::config()
        };
        let ctx = context_with(shoot(), &config);
        assert_eq!(ctx.compute_out_of_cluster_api_server_address(true), "1.2.3.4");
        assert_eq!(ctx.compute_out_of_cluster_api_server_address(false), "1.2.3.4");
    }

    #[test]
    fn test_external_address_falls_back_to_internal_domain() {
        let mut shoot = shoot();
        shoot.spec.dns = None;
        let ctx = context_with(shoot, &fixtures::config());
        assert_eq!(
            ctx.compute_out_of_cluster_api_server_address(false),
            "api.local.dev.internal.example.com"
        );
    }

    #[test]
    fn test_ingress_hosts() {
        let ctx = context();
        assert_eq!(
            ctx.grafana_hosts(),
            vec![
                "g-operators-dev--local.ingress.seed.example.com".to_string(),
                "g-users-dev--local.ingress.seed.example.com".to_string(),
            ]
        );
        assert_eq!(ctx.kibana_host(), "k-dev--local.ingress.seed.example.com");
        assert_eq!(
            ctx.alertmanager_hosts(),
            vec!["au-dev--local.ingress.seed.example.com".to_string()]
        );
    }

    #[test]
    fn test_basic_authentication_defaults_to_enabled() {
        assert!(context().wants_basic_authentication());

        let mut shoot = shoot();
        shoot.spec.kubernetes.kube_api_server = Some(KubeApiServerConfig {
            enable_basic_authentication: Some(false),
        });
        assert!(!context_with(shoot, &fixtures::config()).wants_basic_authentication());
    }

    #[test]
    fn test_operation_annotation() {
        assert!(!context().wants_kubeconfig_rotation());

        let mut shoot = shoot();
        shoot.metadata.annotations = Some(BTreeMap::from([(
            "shoot.garden.sapcloud.io/operation".to_string(),
            "rotate-kubeconfig-credentials".to_string(),
        )]));
        assert!(context_with(shoot, &fixtures::config()).wants_kubeconfig_rotation());
    }

    #[test]
    fn test_kubernetes_version_comparison() {
        let ctx = context();
        assert!(ctx.kubernetes_version_at_least(1, 16).unwrap());
        assert!(!ctx.kubernetes_version_at_least(1, 19).unwrap());

        let mut shoot = shoot();
        shoot.spec.kubernetes.version = "latest".to_string();
        assert_eq!(
            context_with(shoot, &fixtures::config())
                .kubernetes_version_at_least(1, 16)
                .unwrap_err(),
            ShootError::InvalidVersion("latest".to_string())
        );
    }

    #[test]
    fn test_workload_toggles() {
        let ctx = context();
        assert!(ctx.wants_cluster_autoscaler());
        assert!(!ctx.ipvs_enabled());
        assert!(!ctx.wants_kyma());

        let mut shoot = shoot();
        shoot.spec.provider.workers = vec![fixtures::worker("fixed", 2, 2)];
        shoot.spec.kubernetes.kube_proxy = Some(KubeProxyConfig {
            mode: Some("IPVS".to_string()),
            ..KubeProxyConfig::default()
        });
        let ctx = context_with(shoot, &fixtures::config());
        assert!(!ctx.wants_cluster_autoscaler());
        assert!(ctx.ipvs_enabled());
    }
}
