use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::provider::ProviderKind;

/// Machine is the worker manifest consumed by the machine-controller running
/// in the cluster's control plane namespace
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "cluster.k8s.io",
    version = "v1alpha1",
    kind = "Machine",
    plural = "machines",
    namespaced,
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    pub provider_config: ProviderConfig,
    #[serde(default)]
    pub versions: MachineVersionInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub cloud_provider: ProviderKind,
    /// Node sizing merged with credentials and datacenter placement
    pub cloud_provider_spec: serde_json::Value,
    pub operating_system: String,
    pub operating_system_spec: serde_json::Value,
    #[serde(default)]
    pub ssh_public_keys: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            cloud_provider: ProviderKind::Fake,
            cloud_provider_spec: serde_json::Value::Object(Default::default()),
            operating_system: String::new(),
            operating_system_spec: serde_json::Value::Object(Default::default()),
            ssh_public_keys: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MachineVersionInfo {
    #[serde(default)]
    pub kubelet: String,
}
