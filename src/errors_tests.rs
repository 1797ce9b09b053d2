// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for botanist error types.

#[cfg(test)]
mod tests {
    use crate::errors::*;

    #[test]
    fn test_missing_token_error() {
        let error = SecretsError::MissingToken {
            secret: "static-token".to_string(),
            username: "system:cluster-admin".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "static token 'static-token' has no token for username 'system:cluster-admin'"
        );
    }

    #[test]
    fn test_unresolved_signing_ca_error() {
        let error = SecretsError::UnresolvedSigningCa {
            secret: "kube-apiserver".to_string(),
            ca: "ca".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "certificate 'kube-apiserver' references unknown signing CA 'ca'"
        );
    }

    #[test]
    fn test_not_generated_error() {
        let error = SecretsError::NotGenerated("kubecfg".to_string());
        assert_eq!(error.to_string(), "secret 'kubecfg' has not been generated");
    }

    #[test]
    fn test_chart_render_failed_error() {
        let error = ChartError::RenderFailed {
            release: "shoot-core".to_string(),
            reason: "template: missing value".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "rendering chart 'shoot-core' failed: template: missing value"
        );
    }

    #[test]
    fn test_image_not_found_error() {
        let error = ImageVectorError::NotFound("coredns".to_string());
        assert_eq!(error.to_string(), "image 'coredns' not found in image vector");
    }

    #[test]
    fn test_flow_task_error_reports_counts() {
        let error = FlowError::Task {
            failed: 2,
            total: 5,
            first: anyhow::anyhow!("boom"),
        };

        assert_eq!(error.to_string(), "2 of 5 tasks failed, first error: boom");
    }

    #[test]
    fn test_config_errors() {
        let error = ConfigError::InvalidBool {
            name: "BOTANIST_LEGACY_SECRET_CLEANUP".to_string(),
            value: "maybe".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "invalid boolean 'maybe' for BOTANIST_LEGACY_SECRET_CLEANUP"
        );

        let error = ConfigError::UnknownFeatureGate("Bogus".to_string());
        assert_eq!(error.to_string(), "unknown feature gate 'Bogus'");
    }

    #[test]
    fn test_shoot_errors() {
        let error = ShootError::MissingNetwork {
            shoot: "local".to_string(),
            network: "services".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "shoot 'local' does not specify a services network"
        );

        let error = ShootError::InvalidVersion("one.two".to_string());
        assert_eq!(error.to_string(), "invalid kubernetes version 'one.two'");
    }

    #[test]
    fn test_secrets_error_is_downcastable_through_anyhow() {
        let err: anyhow::Error = SecretsError::NotGenerated("ca".to_string()).into();
        let err = err.context("deploying secrets");

        assert_eq!(
            err.downcast_ref::<SecretsError>(),
            Some(&SecretsError::NotGenerated("ca".to_string()))
        );
    }
}
