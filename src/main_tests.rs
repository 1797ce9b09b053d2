// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `main.rs` - command line parsing

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::time::Duration as StdDuration;
    use tokio::time::timeout;

    const REQUIRED: [&str; 9] = [
        "botanist",
        "--shoot-name",
        "local",
        "--shoot-namespace",
        "garden-dev",
        "--internal-domain",
        "local.dev.internal.example.com",
        "--api-server-address",
        "1.2.3.4",
    ];

    #[test]
    fn test_cli_defaults_to_all_phases() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();

        assert_eq!(cli.phases, Phase::ALL.to_vec());
        assert_eq!(cli.project_name(), "dev");
        assert!(cli.metrics_file.is_none());
    }

    #[test]
    fn test_cli_selects_phases() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--phase", "generate,deploy", "--phase", "managed-resources"]);

        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(
            cli.phases,
            vec![Phase::Generate, Phase::Deploy, Phase::ManagedResources]
        );
    }

    #[test]
    fn test_cli_rejects_unknown_phase() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--phase", "reconcile"]);

        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_project_name_override() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--project", "other"]);

        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.project_name(), "other");
    }

    #[test]
    fn test_project_name_without_prefix() {
        let mut args = REQUIRED.to_vec();
        args[4] = "garden";

        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.project_name(), "garden");
    }

    #[tokio::test]
    async fn test_write_metrics() {
        metrics::record_managed_resource_reconciled("main-test");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.prom");

        write_metrics(&path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("gardener_botanist_managed_resources_reconciled_total"));
    }

    /// The interrupt handler must not fire without a signal
    #[tokio::test]
    async fn test_ctrl_c_pending_without_signal() {
        let result = timeout(StdDuration::from_millis(100), tokio::signal::ctrl_c()).await;
        assert!(result.is_err());
    }
}
