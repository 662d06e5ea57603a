use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::cloud::CloudSpec;

/// Cluster is a tenant's hosted Kubernetes control plane, bound to exactly
/// one datacenter and cloud provider
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "kplane.io",
    version = "v1",
    kind = "Cluster",
    plural = "clusters",
    derive = "Default",
    derive = "PartialEq",
    status = "ClusterStatus",
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Datacenter","type":"string","jsonPath":".spec.cloud.dc"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Cloud credentials and datacenter; the provider may not change
    pub cloud: CloudSpec,

    /// Target Kubernetes version, e.g. "1.9.0"
    pub version: String,

    #[serde(default)]
    pub cluster_network: ClusterNetworkingConfig,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub human_readable_name: String,

    #[serde(default)]
    pub audit_logging: bool,

    #[serde(default)]
    pub use_pod_security_policy: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetworkingConfig {
    #[serde(default)]
    pub services: NetworkRanges,

    #[serde(default)]
    pub pods: NetworkRanges,

    #[serde(default)]
    pub dns_domain: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRanges {
    #[serde(default)]
    pub cidr_blocks: Vec<String>,
}

/// Status of a Cluster
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// Namespace holding the control plane objects
    #[serde(default)]
    pub namespace_name: String,

    #[serde(default)]
    pub address: ClusterAddress,
}

/// Externally reachable address of the control plane
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAddress {
    #[serde(default)]
    pub external_name: String,

    #[serde(default)]
    pub ip: String,

    #[serde(default)]
    pub admin_token: String,
}

impl Cluster {
    pub fn cluster_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn datacenter_name(&self) -> &str {
        &self.spec.cloud.datacenter_name
    }

    /// Namespace of the control plane, defaulting to `cluster-<name>`
    pub fn namespace_name(&self) -> String {
        match self.status.as_ref().map(|s| s.namespace_name.as_str()) {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ => format!("cluster-{}", self.cluster_name()),
        }
    }

    pub fn address(&self) -> ClusterAddress {
        self.status
            .as_ref()
            .map(|s| s.address.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_defaults_to_cluster_prefix() {
        let cluster = Cluster::new("de-test-01", ClusterSpec::default());
        assert_eq!(cluster.namespace_name(), "cluster-de-test-01");
    }

    #[test]
    fn test_namespace_prefers_status() {
        let mut cluster = Cluster::new("de-test-01", ClusterSpec::default());
        cluster.status = Some(ClusterStatus {
            namespace_name: "custom-ns".to_string(),
            ..Default::default()
        });
        assert_eq!(cluster.namespace_name(), "custom-ns");
    }

    #[test]
    fn test_deserializes_datacenter_reference() {
        let cluster: Cluster = serde_json::from_value(serde_json::json!({
            "apiVersion": "kplane.io/v1",
            "kind": "Cluster",
            "metadata": { "name": "c1" },
            "spec": {
                "cloud": { "dc": "do-fra1", "digitalocean": { "token": "t" } },
                "version": "1.9.0"
            }
        }))
        .unwrap();
        assert_eq!(cluster.datacenter_name(), "do-fra1");
        assert_eq!(cluster.spec.version, "1.9.0");
    }
}
