// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `managed_resources.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::labels::MANAGED_RESOURCE;

    #[test]
    fn test_secret_name() {
        assert_eq!(
            managed_resource_secret_name("shoot-core"),
            "managedresource-shoot-core"
        );
    }

    #[test]
    fn test_build_managed_resource() {
        let mr = build_managed_resource(
            "shoot-core-namespaces",
            "shoot--dev--local",
            &["managedresource-shoot-core-namespaces".to_string()],
            true,
        );

        assert_eq!(mr.metadata.name.as_deref(), Some("shoot-core-namespaces"));
        assert_eq!(mr.metadata.namespace.as_deref(), Some("shoot--dev--local"));
        assert_eq!(
            mr.metadata.labels.as_ref().unwrap().get("origin").map(String::as_str),
            Some("gardener")
        );
        assert_eq!(mr.spec.keep_objects, Some(true));
        assert_eq!(
            mr.spec.injected_labels.get("shoot.gardener.cloud/no-cleanup").map(String::as_str),
            Some("true")
        );
        assert_eq!(mr.spec.secret_refs.len(), 1);
        assert_eq!(mr.spec.secret_refs[0].name, "managedresource-shoot-core-namespaces");
    }

    #[test]
    fn test_build_managed_resource_secret() {
        let mut data = SecretData::new();
        data.insert("shoot-core_templates_rbac.yaml".to_string(), b"kind: Role".to_vec());
        let labels = BTreeMap::from([(
            MANAGED_RESOURCE.to_string(),
            "shoot-cloud-config-execution".to_string(),
        )]);

        let secret = build_managed_resource_secret("worker-a", "shoot--dev--local", &data, labels);
        assert_eq!(
            secret.metadata.labels.as_ref().unwrap()["managed-resource"],
            "shoot-cloud-config-execution"
        );
        assert_eq!(
            secret.data.as_ref().unwrap()["shoot-core_templates_rbac.yaml"].0,
            b"kind: Role".to_vec()
        );

        let unlabelled =
            build_managed_resource_secret("worker-a", "shoot--dev--local", &data, BTreeMap::new());
        assert!(unlabelled.metadata.labels.is_none());
    }
}
