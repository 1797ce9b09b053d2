// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Chart rendering.
//!
//! Charts are rendered into plain manifests which are then stored in secrets
//! and applied into the shoot by the managed-resource controller. The
//! [`ChartRenderer`] trait keeps the orchestration independent of the tool
//! doing the rendering; [`HelmRenderer`] shells out to `helm template`.

use crate::errors::ChartError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, error};

/// Marker helm puts before every rendered document
const SOURCE_MARKER: &str = "# Source: ";

/// Manifests of a rendered chart, keyed by template file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedChart {
    pub name: String,
    /// Template path (e.g. `shoot-core/templates/rbac.yaml`) to manifest
    pub manifests: BTreeMap<String, String>,
}

impl RenderedChart {
    /// Split `helm template` output into one manifest per source file.
    ///
    /// Documents from the same file are joined with a YAML separator.
    /// Documents without a source marker are ignored.
    #[must_use]
    pub fn parse(name: &str, output: &str) -> Self {
        let mut manifests: BTreeMap<String, String> = BTreeMap::new();

        for document in output.split("\n---") {
            let mut lines = document.lines().skip_while(|l| l.trim().is_empty() || l.trim() == "---");
            let Some(source) = lines.next().and_then(|l| l.strip_prefix(SOURCE_MARKER)) else {
                continue;
            };

            let body = lines.collect::<Vec<_>>().join("\n");
            if body.trim().is_empty() {
                continue;
            }

            manifests
                .entry(source.trim().to_string())
                .and_modify(|existing| {
                    existing.push_str("\n---\n");
                    existing.push_str(&body);
                })
                .or_insert(body);
        }

        Self {
            name: name.to_string(),
            manifests,
        }
    }

    /// Secret data holding every manifest; slashes in file names become underscores.
    #[must_use]
    pub fn as_secret_data(&self) -> BTreeMap<String, Vec<u8>> {
        self.manifests
            .iter()
            .map(|(file, manifest)| (file.replace('/', "_"), manifest.clone().into_bytes()))
            .collect()
    }
}

/// Renders a chart directory with values into manifests.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the chart is missing or rendering fails.
    async fn render(
        &self,
        chart_path: &Path,
        release: &str,
        namespace: &str,
        values: &serde_json::Value,
    ) -> Result<RenderedChart, ChartError>;
}

/// [`ChartRenderer`] running `helm template`.
#[derive(Clone, Debug)]
pub struct HelmRenderer {
    binary: String,
}

impl HelmRenderer {
    #[must_use]
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

#[async_trait]
impl ChartRenderer for HelmRenderer {
    async fn render(
        &self,
        chart_path: &Path,
        release: &str,
        namespace: &str,
        values: &serde_json::Value,
    ) -> Result<RenderedChart, ChartError> {
        if !chart_path.exists() {
            return Err(ChartError::MissingChart(chart_path.display().to_string()));
        }

        let io_err = |source: std::io::Error| ChartError::Io {
            release: release.to_string(),
            source,
        };

        let yaml = serde_yaml::to_string(values).map_err(|source| ChartError::Values {
            release: release.to_string(),
            source,
        })?;
        let values_file = tempfile::Builder::new()
            .prefix("values-")
            .suffix(".yaml")
            .tempfile()
            .map_err(io_err)?;
        tokio::fs::write(values_file.path(), yaml)
            .await
            .map_err(io_err)?;

        debug!(
            release = %release,
            namespace = %namespace,
            chart = %chart_path.display(),
            "Rendering chart"
        );

        let output = Command::new(&self.binary)
            .arg("template")
            .arg(release)
            .arg(chart_path)
            .arg("--namespace")
            .arg(namespace)
            .arg("--values")
            .arg(values_file.path())
            .output()
            .await
            .map_err(io_err)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(release = %release, "Chart rendering failed: {}", stderr);
            return Err(ChartError::RenderFailed {
                release: release.to_string(),
                reason: if stderr.is_empty() {
                    format!("{} exited with {}", self.binary, output.status)
                } else {
                    stderr
                },
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| ChartError::RenderFailed {
            release: release.to_string(),
            reason: format!("output is not UTF-8: {e}"),
        })?;

        Ok(RenderedChart::parse(release, &stdout))
    }
}

#[cfg(test)]
#[path = "chart_tests.rs"]
mod chart_tests;
