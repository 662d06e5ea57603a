use crate::merge;
use crate::names::*;
use crate::pod;
use crate::template::TemplateData;
use k8s_openapi::api::core::v1::ConfigMap;
use kplane_core::{ConfigurationError, Result};
use serde_json::json;
use std::collections::BTreeMap;

const PROMETHEUS_CONFIG_KEY: &str = "prometheus.yaml";

/// Scrape configuration of the per-cluster Prometheus
pub fn config_map(data: &TemplateData, existing: Option<&ConfigMap>) -> Result<ConfigMap> {
    let namespace = data.namespace();
    let config = json!({
        "global": {
            "evaluation_interval": "30s",
            "scrape_interval": "30s",
            "external_labels": { "cluster": data.cluster_name() },
        },
        "scrape_configs": [
            {
                "job_name": "etcd",
                "static_configs": [{
                    "targets": [format!("{}.{}.svc.cluster.local:2379", ETCD_CLIENT_SERVICE_NAME, namespace)],
                }],
            },
            {
                "job_name": "apiserver",
                "scheme": "https",
                "tls_config": {
                    "ca_file": format!("/etc/kubernetes/{}/ca.crt", CA_CERT_SECRET_NAME),
                    "server_name": APISERVER_INTERNAL_SERVICE_NAME,
                },
                "static_configs": [{
                    "targets": [format!("{}.{}.svc.cluster.local:443", APISERVER_INTERNAL_SERVICE_NAME, namespace)],
                }],
            },
            {
                "job_name": "machine-controller",
                "kubernetes_sd_configs": [{
                    "role": "pod",
                    "namespaces": { "names": [namespace] },
                }],
                "relabel_configs": [{
                    "source_labels": ["__meta_kubernetes_pod_label_app"],
                    "regex": MACHINE_CONTROLLER_DEPLOYMENT_NAME,
                    "action": "keep",
                }],
            },
        ],
    });
    let rendered = serde_yaml::to_string(&config).map_err(|err| {
        ConfigurationError::Invalid(format!("failed to render prometheus config: {}", err))
    })?;

    Ok(ConfigMap {
        metadata: merge::object_meta(
            data,
            PROMETHEUS_CONFIG_MAP_NAME,
            pod::app_labels(data, PROMETHEUS_CONFIG_MAP_NAME),
            existing.map(|c| &c.metadata),
        ),
        data: Some(BTreeMap::from([(PROMETHEUS_CONFIG_KEY.to_string(), rendered)])),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_scrapes_cluster_namespace() {
        let data = testing::template_data(testing::bringyourown_cloud(), "1.8.0");
        let cm = config_map(&data, None).unwrap();
        let config: serde_yaml::Value =
            serde_yaml::from_str(&cm.data.unwrap()[PROMETHEUS_CONFIG_KEY]).unwrap();
        assert_eq!(config["global"]["external_labels"]["cluster"], "de-test-01");
        assert_eq!(
            config["scrape_configs"][0]["static_configs"][0]["targets"][0],
            "etcd-client.cluster-de-test-01.svc.cluster.local:2379"
        );
    }
}
