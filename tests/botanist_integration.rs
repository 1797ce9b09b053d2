// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Integration tests for the botanist phases
//!
//! These tests run against a real cluster that serves as garden, seed and
//! shoot at once. The `ShootState` and `ManagedResource` CRDs must be
//! installed (`cargo run --bin crdgen` writes them to deploy/crds/).
//!
//! Run with: cargo test --test botanist_integration -- --ignored

mod common;

use botanist::botanist::shoot::ShootContext;
use botanist::botanist::{Botanist, Phase};
use botanist::crd::{ManagedResource, ShootState};
use botanist::imagevector::ImageVector;
use botanist::reconcilers::list_secrets;
use common::*;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, PostParams};
use kube::client::Client;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn new_botanist(client: &Client, namespace: &str, shoot_name: &str) -> Botanist {
    let config = test_config();
    let context = ShootContext::new(
        test_shoot(namespace, shoot_name),
        PROJECT,
        INTERNAL_DOMAIN,
        API_SERVER_ADDRESS,
        &config,
    )
    .expect("test shoot is valid");

    Botanist::new(
        client.clone(),
        client.clone(),
        client.clone(),
        context,
        config,
        Arc::new(StaticRenderer),
        ImageVector::parse(IMAGE_VECTOR).expect("image vector parses"),
        CancellationToken::new(),
    )
    .await
    .expect("botanist starts")
}

#[tokio::test]
#[ignore = "requires a Kubernetes cluster with the botanist CRDs"]
async fn test_generate_and_deploy_secrets() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    let namespace = "botanist-it-secrets";
    create_test_namespace(&client, namespace).await.unwrap();

    let mut botanist = new_botanist(&client, namespace, "local").await;
    botanist
        .run(&[Phase::Load, Phase::Generate, Phase::Deploy])
        .await
        .unwrap();

    let secrets = list_secrets(&client, namespace, None).await.unwrap();
    for name in ["ca", "kube-apiserver", "kubecfg", "static-token", "ssh-keypair"] {
        assert!(secrets.contains_key(name), "secret {name} was not deployed");
    }
    assert!(botanist.api_server_health_check_token.is_some());

    let states: Api<ShootState> = Api::namespaced(client.clone(), namespace);
    let state = states.get("local").await.unwrap();
    let ca_entry = state
        .spec
        .gardener
        .iter()
        .find(|e| e.name == "ca")
        .cloned()
        .expect("ca is in the ledger");

    // A second run must reuse the persisted CA
    let mut second = new_botanist(&client, namespace, "local").await;
    second.run(&[Phase::Generate]).await.unwrap();
    let state = states.get("local").await.unwrap();
    assert!(state.spec.gardener.contains(&ca_entry));

    delete_test_namespace(&client, namespace).await;
}

#[tokio::test]
#[ignore = "requires a Kubernetes cluster with the botanist CRDs"]
async fn test_deploy_managed_resources() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    let namespace = "botanist-it-managed";
    create_test_namespace(&client, namespace).await.unwrap();

    let mut botanist = new_botanist(&client, namespace, "local").await;
    botanist
        .run(&[Phase::Generate, Phase::Deploy, Phase::ManagedResources])
        .await
        .unwrap();

    let managed_resources: Api<ManagedResource> = Api::namespaced(client.clone(), namespace);
    for name in ["shoot-core", "shoot-core-namespaces", "addons", "addons-kyma", "shoot-cloud-config-execution"] {
        assert!(
            managed_resources.get_opt(name).await.unwrap().is_some(),
            "managed resource {name} is missing"
        );
    }

    let namespaces = managed_resources.get("shoot-core-namespaces").await.unwrap();
    assert_eq!(namespaces.spec.keep_objects, Some(true));

    let cloud_config = list_secrets(
        &client,
        namespace,
        Some("managed-resource=shoot-cloud-config-execution"),
    )
    .await
    .unwrap();
    assert!(cloud_config.contains_key("managedresource-shoot-cloud-config-execution-worker"));
    assert!(cloud_config.contains_key("managedresource-shoot-cloud-config-rbac"));

    delete_test_namespace(&client, namespace).await;
}

#[tokio::test]
#[ignore = "requires a Kubernetes cluster with the botanist CRDs"]
async fn test_delete_stale_secrets() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    let namespace = "botanist-it-gc";
    create_test_namespace(&client, namespace).await.unwrap();

    let labels = BTreeMap::from([("managed-resource".to_string(), "it".to_string())]);
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    for name in ["wanted", "stale-a", "stale-b"] {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            ..Default::default()
        };
        secrets.create(&PostParams::default(), &secret).await.unwrap();
    }

    let botanist = new_botanist(&client, namespace, "local").await;
    let wanted = BTreeSet::from(["wanted".to_string()]);
    let deleted = botanist
        .delete_stale_secrets_matching_labels(&labels, &wanted)
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let remaining = list_secrets(&client, namespace, Some("managed-resource=it"))
        .await
        .unwrap();
    assert_eq!(remaining.keys().collect::<Vec<_>>(), vec!["wanted"]);

    delete_test_namespace(&client, namespace).await;
}
