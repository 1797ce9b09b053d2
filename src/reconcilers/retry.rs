// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bounded retry of Kubernetes updates that lost an optimistic-concurrency race.
//!
//! Only HTTP 409 conflicts are retried. Each attempt re-reads the object, so a
//! retry always works on the latest `resourceVersion`. Every other error fails
//! immediately.

use crate::constants::{CONFLICT_RETRY_INTERVAL_MILLIS, CONFLICT_RETRY_JITTER, CONFLICT_RETRY_STEPS};
use crate::reconcilers::resources::is_conflict;
use anyhow::Result;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed-interval backoff with jitter and a bounded number of steps.
#[derive(Clone, Debug, PartialEq)]
pub struct ConflictBackoff {
    /// Total attempts, including the first one
    pub steps: u32,
    pub interval: Duration,
    /// Randomization factor (e.g., 0.1 for ±10%)
    pub jitter: f64,
}

impl Default for ConflictBackoff {
    fn default() -> Self {
        Self {
            steps: CONFLICT_RETRY_STEPS,
            interval: Duration::from_millis(CONFLICT_RETRY_INTERVAL_MILLIS),
            jitter: CONFLICT_RETRY_JITTER,
        }
    }
}

impl ConflictBackoff {
    /// Wait time before the next attempt, with jitter applied.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        if self.jitter == 0.0 {
            return self.interval;
        }

        let secs = self.interval.as_secs_f64();
        let delta = secs * self.jitter;
        let jittered = rand::thread_rng().gen_range((secs - delta)..=(secs + delta));

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Run `operation` until it succeeds, fails with a non-conflict error or the
/// backoff runs out of steps.
///
/// # Errors
///
/// Returns the last error if all attempts conflicted, or the first
/// non-conflict error.
///
/// # Example
///
/// ```no_run
/// use botanist::crd::Shoot;
/// use botanist::reconcilers::retry::{retry_on_conflict, ConflictBackoff};
/// use kube::api::PostParams;
/// use kube::{Api, Client};
///
/// # async fn example(client: Client) -> anyhow::Result<()> {
/// let api: Api<Shoot> = Api::namespaced(client, "garden-dev");
/// retry_on_conflict(&ConflictBackoff::default(), "clear shoot annotations", || async {
///     let mut shoot = api.get("local").await?;
///     shoot.metadata.annotations = None;
///     api.replace("local", &PostParams::default(), &shoot).await
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_on_conflict<T, F, Fut>(
    backoff: &ConflictBackoff,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, kube::Error>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                debug!(operation = operation_name, attempt = attempt, "Update succeeded");
                return Ok(value);
            }
            Err(e) if is_conflict(&e) && attempt < backoff.steps => {
                let delay = backoff.next_delay();
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    retry_after = ?delay,
                    "Conflict while updating, will retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("{operation_name} failed after {attempt} attempt(s)")));
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
