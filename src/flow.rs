// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Concurrent fan-out of independent tasks.
//!
//! All tasks run to completion; every failure is logged and the first one in
//! task order is returned. Cancelling the shared token drops the tasks still
//! in flight and returns [`FlowError::Cancelled`].

use crate::errors::FlowError;
use futures::future::{join_all, BoxFuture};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// A boxed task for [`parallel`].
pub type Task<'a> = BoxFuture<'a, anyhow::Result<()>>;

/// Run `tasks` concurrently and wait for all of them.
///
/// # Errors
///
/// Returns [`FlowError::Cancelled`] if `cancel` fires first, otherwise
/// [`FlowError::Task`] carrying the first failure if any task failed.
pub async fn parallel(
    cancel: &CancellationToken,
    name: &str,
    tasks: Vec<Task<'_>>,
) -> Result<(), FlowError> {
    let total = tasks.len();
    if total == 0 {
        return Ok(());
    }

    debug!(flow = name, count = total, "Running tasks in parallel");

    let results = tokio::select! {
        () = cancel.cancelled() => {
            error!(flow = name, "Task group cancelled");
            return Err(FlowError::Cancelled);
        }
        results = join_all(tasks) => results,
    };

    let mut errors: Vec<anyhow::Error> = results.into_iter().filter_map(Result::err).collect();
    if errors.is_empty() {
        return Ok(());
    }

    for (index, err) in errors.iter().enumerate() {
        error!(flow = name, index = index, error = %err, "Task failed");
    }

    Err(FlowError::Task {
        failed: errors.len(),
        total,
        first: errors.swap_remove(0),
    })
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod flow_tests;
