// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The botanist: drives the secrets and managed resources of one shoot.
//!
//! A [`Botanist`] holds the clients for the garden, the seed and the shoot,
//! the facts about the shoot being reconciled and the state shared between
//! phases. Each [`Phase`] maps onto one group of operations:
//!
//! | Phase | Operations |
//! |-------|------------|
//! | `load` | [`Botanist::load_existing_secrets_into_shoot_state`] |
//! | `generate` | [`Botanist::generate_and_save_secrets`] |
//! | `deploy` | [`Botanist::deploy_secrets`] |
//! | `cloud-provider` | [`Botanist::deploy_cloud_provider_secret`] |
//! | `sync` | [`Botanist::sync_shoot_credentials_to_garden`] |
//! | `managed-resources` | [`Botanist::deploy_managed_resources`] |
//!
//! # Modules
//!
//! - [`shoot`] - facts derived from the `Shoot` object
//! - [`wanted_secrets`] - the catalog of control-plane secrets
//! - [`cache`] - deployed secrets and their checksums
//! - [`secrets`] - secret lifecycle operations
//! - [`addons`] - chart values and managed-resource bundles

pub mod addons;
pub mod cache;
pub mod secrets;
pub mod shoot;
pub mod wanted_secrets;

#[cfg(test)]
mod fixtures;

use crate::chart::ChartRenderer;
use crate::config::BotanistConfig;
use crate::crd::ShootState;
use crate::imagevector::ImageVector;
use crate::metrics;
use crate::secrets::ledger::GardenerResourceDataList;
use anyhow::{Context, Result};
use cache::SecretCache;
use clap::ValueEnum;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use shoot::ShootContext;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// A step of a botanist run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    /// Import live secrets into the shoot state
    Load,
    /// Generate missing or outdated secret material
    Generate,
    /// Write secrets into the seed namespace
    Deploy,
    /// Copy the infrastructure credentials into the seed namespace
    CloudProvider,
    /// Copy end-user credentials into the project namespace
    Sync,
    /// Render charts and reconcile the managed resources
    ManagedResources,
}

impl Phase {
    /// Every phase in execution order.
    pub const ALL: [Phase; 6] = [
        Phase::Load,
        Phase::Generate,
        Phase::Deploy,
        Phase::CloudProvider,
        Phase::Sync,
        Phase::ManagedResources,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Generate => "generate",
            Phase::Deploy => "deploy",
            Phase::CloudProvider => "cloud-provider",
            Phase::Sync => "sync",
            Phase::ManagedResources => "managed-resources",
        }
    }
}

/// Orchestrates the secrets and managed resources of a single shoot.
pub struct Botanist {
    /// Client of the seed hosting the control plane
    pub seed_client: Client,
    /// Client of the garden holding `Shoot` and `ShootState` objects
    pub garden_client: Client,
    /// Client of the shoot itself
    pub shoot_client: Client,
    pub shoot: ShootContext,
    pub config: BotanistConfig,
    pub chart_renderer: Arc<dyn ChartRenderer>,
    pub image_vector: ImageVector,
    pub cache: SecretCache,
    pub cancel: CancellationToken,
    /// Ledger as last persisted into the `ShootState`
    pub ledger: GardenerResourceDataList,
    pub api_server_health_check_token: Option<String>,
    pub control_plane_wildcard_cert: Option<Secret>,
}

impl Botanist {
    /// Build a botanist and read the shoot's persisted ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the `ShootState` cannot be read.
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        seed_client: Client,
        garden_client: Client,
        shoot_client: Client,
        shoot: ShootContext,
        config: BotanistConfig,
        chart_renderer: Arc<dyn ChartRenderer>,
        image_vector: ImageVector,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let ledger = read_ledger(&garden_client, &shoot).await?;
        info!(
            shoot = %shoot.name(),
            namespace = %shoot.seed_namespace,
            entries = ledger.len(),
            "Loaded shoot state"
        );

        Ok(Self {
            seed_client,
            garden_client,
            shoot_client,
            shoot,
            config,
            chart_renderer,
            image_vector,
            cache: SecretCache::new(),
            cancel,
            ledger,
            api_server_health_check_token: None,
            control_plane_wildcard_cert: None,
        })
    }

    /// Run `phases` in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the failed phase.
    pub async fn run(&mut self, phases: &[Phase]) -> Result<()> {
        for phase in phases {
            let start = Instant::now();
            let result = match phase {
                Phase::Load => self.load_existing_secrets_into_shoot_state().await,
                Phase::Generate => self.generate_and_save_secrets().await,
                Phase::Deploy => self.deploy_secrets().await,
                Phase::CloudProvider => self.deploy_cloud_provider_secret().await,
                Phase::Sync => self.sync_shoot_credentials_to_garden().await,
                Phase::ManagedResources => self.deploy_managed_resources().await,
            };

            let elapsed = start.elapsed();
            match result {
                Ok(()) => {
                    metrics::record_phase_success(phase.as_str(), elapsed);
                    info!(phase = phase.as_str(), duration = ?elapsed, "Phase completed");
                }
                Err(e) => {
                    metrics::record_phase_error(phase.as_str(), elapsed);
                    error!(phase = phase.as_str(), error = %e, "Phase failed");
                    return Err(e.context(format!("phase {} failed", phase.as_str())));
                }
            }
        }

        Ok(())
    }
}

async fn read_ledger(garden_client: &Client, shoot: &ShootContext) -> Result<GardenerResourceDataList> {
    let api: Api<ShootState> = Api::namespaced(garden_client.clone(), &shoot.project_namespace());
    let state = api
        .get_opt(&shoot.name())
        .await
        .with_context(|| format!("failed to read shoot state of {}", shoot.name()))?;

    Ok(state
        .map(|s| GardenerResourceDataList::from(s.spec.gardener))
        .unwrap_or_default())
}
