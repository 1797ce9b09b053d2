// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared shoot fixtures for the botanist unit tests.

use super::shoot::ShootContext;
use crate::config::BotanistConfig;
use crate::crd::{
    Dns, Kubernetes, Machine, Maintenance, Networking, Provider, Shoot, ShootSpec, TimeWindow,
    Worker,
};

pub const PROJECT: &str = "dev";
pub const INTERNAL_DOMAIN: &str = "local.dev.internal.example.com";
pub const EXTERNAL_DOMAIN: &str = "local.dev.example.com";
pub const API_SERVER_ADDRESS: &str = "1.2.3.4";

pub fn worker(name: &str, minimum: i32, maximum: i32) -> Worker {
    Worker {
        name: name.to_string(),
        minimum,
        maximum,
        machine: Machine {
            type_: "m5.large".to_string(),
            image: None,
        },
    }
}

pub fn shoot() -> Shoot {
    let mut shoot = Shoot::new(
        "local",
        ShootSpec {
            dns: Some(Dns {
                domain: Some(EXTERNAL_DOMAIN.to_string()),
            }),
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
                type_: "aws".to_string(),
                workers: vec![worker("worker-a", 1, 3)],
            },
            region: "eu-west-1".to_string(),
            maintenance: Some(Maintenance {
                time_window: Some(TimeWindow {
                    begin: "220000+0000".to_string(),
                    end: "230000+0000".to_string(),
                }),
            }),
            ..ShootSpec::default()
        },
    );
    shoot.metadata.namespace = Some("garden-dev".to_string());
    shoot.metadata.uid = Some("3c1f1a4e-0000-4000-8000-000000000001".to_string());
    shoot
}

pub fn config() -> BotanistConfig {
    BotanistConfig {
        seed_ingress_domain: "ingress.seed.example.com".to_string(),
        ..BotanistConfig::default()
    }
}

pub fn context_with(shoot: Shoot, config: &BotanistConfig) -> ShootContext {
    ShootContext::new(shoot, PROJECT, INTERNAL_DOMAIN, API_SERVER_ADDRESS, config)
        .expect("fixture shoot is valid")
}

pub fn context() -> ShootContext {
    context_with(shoot(), &config())
}
