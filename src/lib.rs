// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Botanist - shoot control-plane secrets and managed resources
//!
//! The botanist prepares the control plane of a shoot cluster that runs in a
//! seed. It generates and persists the shoot's PKI and credentials, deploys
//! them into the seed namespace, copies end-user credentials into the garden
//! and renders the addon charts into `ManagedResource` bundles.
//!
//! ## Modules
//!
//! - [`botanist`] - the phases of a reconciliation and their orchestration
//! - [`secrets`] - secret material generation and the persisted ledger
//! - [`crd`] - `Shoot`, `ShootState` and `ManagedResource` types
//! - [`reconcilers`] - create-or-update, garbage collection and retries
//! - [`chart`] - chart rendering through helm
//! - [`imagevector`] - container image lookup for chart values
//! - [`flow`] - concurrent task execution with cancellation
//! - [`config`] - runtime configuration and feature gates
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use botanist::botanist::{Botanist, Phase};
//!
//! # async fn example(mut botanist: Botanist) -> anyhow::Result<()> {
//! botanist.run(&Phase::ALL).await?;
//! # Ok(())
//! # }
//! ```

pub mod botanist;
pub mod chart;
pub mod config;
pub mod constants;
pub mod crd;
pub mod errors;
pub mod flow;
pub mod imagevector;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod secrets;

#[cfg(test)]
mod crd_tests;
