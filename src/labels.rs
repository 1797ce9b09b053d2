// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across the botanist.
//!
//! This module defines the labels and annotations read from or written to
//! shoots, secrets and managed resources so that every writer agrees on them.

// ============================================================================
// Managed Resource Labels
// ============================================================================

/// Label identifying who created a managed resource
pub const ORIGIN: &str = "origin";

/// Value of the `origin` label for resources created by Gardener
pub const ORIGIN_GARDENER: &str = "gardener";

/// Label on a secret naming the managed resource that references it
pub const MANAGED_RESOURCE: &str = "managed-resource";

/// Label injected into every object a managed resource creates in the shoot
pub const SHOOT_NO_CLEANUP: &str = "shoot.gardener.cloud/no-cleanup";

/// Label marking the purpose of a namespace
pub const GARDENER_PURPOSE: &str = "gardener.cloud/purpose";

// ============================================================================
// Seed Labels
// ============================================================================

/// Label used to find role-specific secrets in the garden namespace
pub const GARDEN_ROLE: &str = "gardener.cloud/role";

/// Role of the seed's wildcard control-plane certificate
pub const ROLE_CONTROL_PLANE_WILDCARD_CERT: &str = "controlplane-cert";

// ============================================================================
// Shoot Annotations
// ============================================================================

/// Annotation requesting a one-off operation on a shoot
pub const GARDENER_OPERATION: &str = "gardener.cloud/operation";

/// Deprecated form of `gardener.cloud/operation`
pub const SHOOT_OPERATION_DEPRECATED: &str = "shoot.garden.sapcloud.io/operation";

/// Operation value requesting fresh kubeconfig credentials
pub const OPERATION_ROTATE_KUBECONFIG_CREDENTIALS: &str = "rotate-kubeconfig-credentials";

/// Annotation enabling the experimental kyma addon
pub const SHOOT_EXPERIMENTAL_ADDON_KYMA: &str = "experimental.addons.shoot.gardener.cloud/kyma";

// ============================================================================
// Secret Annotations
// ============================================================================

/// Annotation carrying the checksum of the cloud provider credentials
pub const CHECKSUM_DATA: &str = "checksum/data";

/// Annotation carrying the endpoint a project secret grants access to
pub const URL: &str = "url";

/// Prefix of pod annotations carrying a secret's checksum
pub const CHECKSUM_SECRET_PREFIX: &str = "checksum/secret-";
