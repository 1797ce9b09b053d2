// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use botanist::{
    botanist::{shoot::ShootContext, Botanist, Phase},
    chart::HelmRenderer,
    config::BotanistConfig,
    crd::Shoot,
    imagevector::ImageVector,
    metrics,
};
use clap::Parser;
use k8s_openapi::api::core::v1::Secret;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Prefix of project namespaces in the garden cluster
const PROJECT_NAMESPACE_PREFIX: &str = "garden-";

/// Prepare the secrets and managed resources of one shoot control plane.
#[derive(Debug, Parser)]
#[command(name = "botanist", version, about)]
struct Cli {
    /// Kubeconfig of the garden cluster (in-cluster config if unset)
    #[arg(long, env = "GARDEN_KUBECONFIG")]
    garden_kubeconfig: Option<PathBuf>,

    /// Kubeconfig of the seed cluster (in-cluster config if unset)
    #[arg(long, env = "SEED_KUBECONFIG")]
    seed_kubeconfig: Option<PathBuf>,

    /// Kubeconfig of the shoot cluster
    #[arg(long, env = "SHOOT_KUBECONFIG")]
    shoot_kubeconfig: Option<PathBuf>,

    /// Name of the shoot
    #[arg(long, env = "SHOOT_NAME")]
    shoot_name: String,

    /// Project namespace of the shoot in the garden cluster
    #[arg(long, env = "SHOOT_NAMESPACE")]
    shoot_namespace: String,

    /// Project name (derived from the namespace if unset)
    #[arg(long, env = "PROJECT_NAME")]
    project: Option<String>,

    /// Internal domain of the shoot, e.g. `local.dev.internal.example.com`
    #[arg(long, env = "INTERNAL_CLUSTER_DOMAIN")]
    internal_domain: String,

    /// Address of the kube-apiserver load balancer
    #[arg(long, env = "API_SERVER_ADDRESS")]
    api_server_address: String,

    /// Cluster IP of the kube-apiserver service in the seed
    #[arg(long, env = "API_SERVER_CLUSTER_IP")]
    api_server_cluster_ip: Option<String>,

    /// Secret in the project namespace holding the infrastructure credentials
    #[arg(long, env = "CLOUD_PROVIDER_SECRET")]
    cloud_provider_secret: Option<String>,

    /// Phases to run, in order
    #[arg(long = "phase", value_enum, value_delimiter = ',', default_values_t = Phase::ALL)]
    phases: Vec<Phase>,

    /// Write the Prometheus text exposition to this file after the run
    #[arg(long, env = "BOTANIST_METRICS_FILE")]
    metrics_file: Option<PathBuf>,
}

impl Cli {
    fn project_name(&self) -> String {
        self.project.clone().unwrap_or_else(|| {
            self.shoot_namespace
                .strip_prefix(PROJECT_NAMESPACE_PREFIX)
                .unwrap_or(&self.shoot_namespace)
                .to_string()
        })
    }
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("botanist")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

fn init_tracing() {
    // RUST_LOG selects the level (default info), RUST_LOG_FORMAT=json|text the output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    info!(shoot = %cli.shoot_name, namespace = %cli.shoot_namespace, "Starting botanist");

    let config = BotanistConfig::from_env()?;
    debug!(?config, "Configuration loaded");

    let garden_client = client_for(cli.garden_kubeconfig.as_deref()).await?;
    let seed_client = client_for(cli.seed_kubeconfig.as_deref()).await?;
    let shoot_client = client_for(cli.shoot_kubeconfig.as_deref()).await?;

    let shoots: Api<Shoot> = Api::namespaced(garden_client.clone(), &cli.shoot_namespace);
    let shoot = shoots
        .get(&cli.shoot_name)
        .await
        .with_context(|| format!("failed to read shoot {}/{}", cli.shoot_namespace, cli.shoot_name))?;

    let cloud_provider_secret = match &cli.cloud_provider_secret {
        Some(name) => {
            let secrets: Api<Secret> = Api::namespaced(garden_client.clone(), &cli.shoot_namespace);
            Some(
                secrets
                    .get(name)
                    .await
                    .with_context(|| format!("failed to read cloud provider secret {name}"))?,
            )
        }
        None => None,
    };

    let mut context = ShootContext::new(
        shoot,
        &cli.project_name(),
        &cli.internal_domain,
        &cli.api_server_address,
        &config,
    )?
    .with_cloud_provider_secret(cloud_provider_secret);
    context.api_server_cluster_ip = cli.api_server_cluster_ip.clone();

    let image_vector = ImageVector::read(&config.image_vector_path).await?;
    let renderer = Arc::new(HelmRenderer::new(&config.helm_binary));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling in-flight work");
            signal_cancel.cancel();
        }
    });

    let mut botanist = Botanist::new(
        seed_client,
        garden_client,
        shoot_client,
        context,
        config,
        renderer,
        image_vector,
        cancel,
    )
    .await?;

    let result = botanist.run(&cli.phases).await;

    if let Some(path) = &cli.metrics_file {
        write_metrics(path).await?;
    }

    result?;
    info!(shoot = %cli.shoot_name, "Botanist finished");
    Ok(())
}

async fn client_for(kubeconfig: Option<&Path>) -> Result<Client> {
    let Some(path) = kubeconfig else {
        return Ok(Client::try_default().await?);
    };

    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
    Ok(Client::try_from(config)?)
}

async fn write_metrics(path: &Path) -> Result<()> {
    let text = metrics::gather_metrics()?;
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("failed to write metrics to {}", path.display()))?;
    debug!(path = %path.display(), "Metrics written");
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
