// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the botanist.
//!
//! This module provides specialized error types for:
//! - Secret material generation and ledger handling
//! - Chart rendering
//! - Image vector lookups
//! - Concurrent task fan-out
//! - Shoot specification facts
//! - Environment configuration
//!
//! Orchestration code wraps these in `anyhow::Error` with context; the typed
//! variants stay inspectable through `downcast_ref`.

use thiserror::Error;

/// Errors raised while generating, loading or persisting secret material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretsError {
    /// A static token does not contain an entry for the requested user.
    ///
    /// Raised when building a config that embeds a token (kubeconfig, VPA
    /// secrets, health check) before the token was added to the static token
    /// config.
    #[error("static token '{secret}' has no token for username '{username}'")]
    MissingToken {
        /// Name of the static token secret
        secret: String,
        /// User whose token was requested
        username: String,
    },

    /// A certificate references a signing CA that was not generated in this pass.
    #[error("certificate '{secret}' references unknown signing CA '{ca}'")]
    UnresolvedSigningCa {
        /// Certificate that needs signing
        secret: String,
        /// Name of the missing CA
        ca: String,
    },

    /// Stored material lacks a key required to rebuild it.
    #[error("secret '{secret}' is missing data key '{key}'")]
    MissingDataKey {
        /// Secret name
        secret: String,
        /// Missing data key
        key: String,
    },

    /// Certificate creation or signing failed.
    #[error("failed to generate certificate '{secret}': {reason}")]
    CertificateGeneration {
        /// Certificate secret name
        secret: String,
        /// Underlying error
        reason: String,
    },

    /// RSA key generation or encoding failed.
    #[error("failed to generate key for '{secret}': {reason}")]
    KeyGeneration {
        /// Secret name
        secret: String,
        /// Underlying error
        reason: String,
    },

    /// A ledger entry could not be decoded.
    #[error("ledger entry '{name}' is malformed: {reason}")]
    MalformedLedgerEntry {
        /// Ledger entry name
        name: String,
        /// Decoding failure
        reason: String,
    },

    /// Generated material could not be serialized (kubeconfig YAML, ledger JSON).
    #[error("failed to serialize '{secret}': {reason}")]
    Serialization {
        /// Secret name
        secret: String,
        /// Serializer error
        reason: String,
    },

    /// A secret was requested for deployment but never generated.
    #[error("secret '{0}' has not been generated")]
    NotGenerated(String),
}

/// Errors raised while rendering a chart bundle.
#[derive(Error, Debug)]
pub enum ChartError {
    /// The chart directory does not exist.
    #[error("chart path does not exist: {0}")]
    MissingChart(String),

    /// The renderer process failed or produced unusable output.
    #[error("rendering chart '{release}' failed: {reason}")]
    RenderFailed {
        /// Helm release name
        release: String,
        /// Renderer output or error
        reason: String,
    },

    /// Values could not be serialized for the renderer.
    #[error("failed to serialize values for chart '{release}': {source}")]
    Values {
        /// Helm release name
        release: String,
        /// Serialization error
        #[source]
        source: serde_yaml::Error,
    },

    /// I/O failure while preparing the render.
    #[error("I/O error while rendering chart '{release}': {source}")]
    Io {
        /// Helm release name
        release: String,
        /// I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while resolving container images.
#[derive(Error, Debug)]
pub enum ImageVectorError {
    /// The requested image is not listed in the image vector.
    #[error("image '{0}' not found in image vector")]
    NotFound(String),

    /// The image vector file could not be parsed.
    #[error("failed to parse image vector: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The image vector file could not be read.
    #[error("failed to read image vector '{path}': {source}")]
    Read {
        /// Path of the image vector
        path: String,
        /// I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by the concurrent task fan-out.
#[derive(Error, Debug)]
pub enum FlowError {
    /// The shared cancellation token fired before all tasks finished.
    #[error("task group cancelled before completion")]
    Cancelled,

    /// At least one task failed; carries the first failure in task order.
    #[error("{failed} of {total} tasks failed, first error: {first}")]
    Task {
        /// Number of failed tasks
        failed: usize,
        /// Number of tasks in the group
        total: usize,
        /// First failure in task order
        first: anyhow::Error,
    },
}

/// Errors raised while deriving facts from a shoot's specification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShootError {
    /// A network CIDR the control plane depends on is not set.
    #[error("shoot '{shoot}' does not specify a {network} network")]
    MissingNetwork {
        /// Shoot name
        shoot: String,
        /// Which network is missing (`services`, `pods`)
        network: String,
    },

    /// A CIDR could not be parsed or is too small.
    #[error("invalid CIDR '{cidr}': {reason}")]
    InvalidCidr {
        /// Offending CIDR
        cidr: String,
        /// Parse failure
        reason: String,
    },

    /// The Kubernetes version is not `major.minor[.patch]`.
    #[error("invalid kubernetes version '{0}'")]
    InvalidVersion(String),
}

/// Errors raised while reading configuration from the environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A boolean variable had an unparseable value.
    #[error("invalid boolean '{value}' for {name}")]
    InvalidBool {
        /// Variable name
        name: String,
        /// Offending value
        value: String,
    },

    /// A feature gate string was malformed.
    #[error("invalid feature gate entry '{0}', expected Name=true|false")]
    InvalidFeatureGate(String),

    /// A feature gate name is not known.
    #[error("unknown feature gate '{0}'")]
    UnknownFeatureGate(String),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
