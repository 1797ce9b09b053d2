// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use crate::crd::*;
    use kube::Resource;
    use serde_json::json;

    #[test]
    fn test_shoot_deserializes_gardener_field_names() {
        let shoot: Shoot = serde_json::from_value(json!({
            "apiVersion": "core.gardener.cloud/v1beta1",
            "kind": "Shoot",
            "metadata": {"name": "local", "namespace": "garden-dev"},
            "spec": {
                "kubernetes": {
                    "version": "1.18.2",
                    "kubeAPIServer": {"enableBasicAuthentication": false},
                    "kubeProxy": {"mode": "IPVS", "featureGates": {"SCTPSupport": true}}
                },
                "networking": {"type": "calico", "pods": "100.96.0.0/11"},
                "provider": {
                    "type": "aws",
                    "workers": [{
                        "name": "worker-a",
                        "minimum": 1,
                        "maximum": 3,
                        "machine": {"type": "m5.large", "image": {"name": "gardenlinux"}}
                    }]
                },
                "region": "eu-west-1",
                "unknownField": "ignored"
            },
            "status": {"clusterIdentity": "abc", "technicalID": "shoot--dev--local"}
        }))
        .unwrap();

        let kubernetes = &shoot.spec.kubernetes;
        assert_eq!(
            kubernetes.kube_api_server.as_ref().unwrap().enable_basic_authentication,
            Some(false)
        );
        let proxy = kubernetes.kube_proxy.as_ref().unwrap();
        assert_eq!(proxy.mode.as_deref(), Some("IPVS"));
        assert_eq!(proxy.feature_gates.get("SCTPSupport"), Some(&true));

        assert_eq!(shoot.spec.networking.type_, "calico");
        assert_eq!(shoot.spec.provider.workers[0].machine.type_, "m5.large");
        assert!(shoot.spec.extensions.is_empty());

        let status = shoot.status.unwrap();
        assert_eq!(status.cluster_identity.as_deref(), Some("abc"));
        assert_eq!(status.technical_id.as_deref(), Some("shoot--dev--local"));
    }

    #[test]
    fn test_shoot_state_round_trips_opaque_data() {
        let data = json!({"certificate": "-----BEGIN CERTIFICATE-----", "nested": {"a": 1}});
        let state = ShootState::new(
            "local",
            ShootStateSpec {
                gardener: vec![GardenerResourceData {
                    name: "ca".to_string(),
                    type_: "certificate".to_string(),
                    data: data.clone(),
                }],
            },
        );

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["spec"]["gardener"][0]["type"], "certificate");
        assert_eq!(value["spec"]["gardener"][0]["data"], data);

        let parsed: ShootState = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.spec, state.spec);
    }

    #[test]
    fn test_shoot_state_defaults_to_empty_ledger() {
        let spec: ShootStateSpec = serde_json::from_value(json!({})).unwrap();
        assert!(spec.gardener.is_empty());
    }

    #[test]
    fn test_managed_resource_serialization() {
        let managed_resource = ManagedResource::new(
            "shoot-core",
            ManagedResourceSpec {
                secret_refs: vec![SecretReference {
                    name: "managedresource-shoot-core".to_string(),
                }],
                keep_objects: Some(false),
                ..ManagedResourceSpec::default()
            },
        );

        let value = serde_json::to_value(&managed_resource).unwrap();
        assert_eq!(value["apiVersion"], "resources.gardener.cloud/v1alpha1");
        assert_eq!(
            value["spec"],
            json!({
                "secretRefs": [{"name": "managedresource-shoot-core"}],
                "keepObjects": false
            })
        );
    }

    #[test]
    fn test_api_groups() {
        assert_eq!(Shoot::group(&()), "core.gardener.cloud");
        assert_eq!(Shoot::version(&()), "v1beta1");
        assert_eq!(ShootState::version(&()), "v1alpha1");
        assert_eq!(ManagedResource::kind(&()), "ManagedResource");
    }
}
