// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `chart.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;

    const HELM_OUTPUT: &str = r"---
# Source: shoot-core/charts/coredns/templates/configmap.yaml
apiVersion: v1
kind: ConfigMap
metadata:
  name: coredns
---
# Source: shoot-core/charts/coredns/templates/service.yaml
apiVersion: v1
kind: Service
metadata:
  name: kube-dns
---
# Source: shoot-core/charts/coredns/templates/configmap.yaml
apiVersion: v1
kind: ConfigMap
metadata:
  name: coredns-custom
---
# Source: shoot-core/charts/monitoring/templates/empty.yaml

";

    #[test]
    fn test_parse_groups_documents_by_source() {
        let chart = RenderedChart::parse("shoot-core", HELM_OUTPUT);

        assert_eq!(chart.name, "shoot-core");
        assert_eq!(chart.manifests.len(), 2);

        let configmaps = &chart.manifests["shoot-core/charts/coredns/templates/configmap.yaml"];
        assert!(configmaps.contains("name: coredns\n---\n"));
        assert!(configmaps.contains("name: coredns-custom"));
        assert!(chart.manifests["shoot-core/charts/coredns/templates/service.yaml"]
            .starts_with("apiVersion: v1\nkind: Service"));
    }

    #[test]
    fn test_as_secret_data_flattens_paths() {
        let chart = RenderedChart::parse("shoot-core", HELM_OUTPUT);
        let data = chart.as_secret_data();

        assert_eq!(
            data.keys().map(String::as_str).collect::<Vec<_>>(),
            vec![
                "shoot-core_charts_coredns_templates_configmap.yaml",
                "shoot-core_charts_coredns_templates_service.yaml",
            ]
        );
        assert!(String::from_utf8(data["shoot-core_charts_coredns_templates_service.yaml"].clone())
            .unwrap()
            .contains("kind: Service"));
    }

    #[test]
    fn test_parse_ignores_output_without_sources() {
        assert!(RenderedChart::parse("x", "").manifests.is_empty());
        assert!(RenderedChart::parse("x", "apiVersion: v1\nkind: List\n")
            .manifests
            .is_empty());
    }

    #[tokio::test]
    async fn test_missing_chart_is_reported() {
        let renderer = HelmRenderer::new("helm");
        let result = renderer
            .render(
                Path::new("/nonexistent/charts/shoot-core"),
                "shoot-core",
                "kube-system",
                &json!({}),
            )
            .await;

        assert!(matches!(result, Err(ChartError::MissingChart(path)) if path.ends_with("shoot-core")));
    }

    #[tokio::test]
    async fn test_failing_renderer_carries_release_name() {
        let chart_dir = tempfile::tempdir().unwrap();
        let renderer = HelmRenderer::new("false");

        let result = renderer
            .render(chart_dir.path(), "addons", "kube-system", &json!({"a": 1}))
            .await;

        match result {
            Err(ChartError::RenderFailed { release, .. }) => assert_eq!(release, "addons"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
