use serde::{Deserialize, Serialize};

use super::datacenter::{DatacenterSpec, NodeSettings};

/// Datacenter as presented to API users
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatacenterView {
    pub metadata: DatacenterViewMeta,
    pub spec: DatacenterViewSpec,
    /// Synthetic entry standing for a whole seed, only listed to admins
    #[serde(default, rename = "seed", skip_serializing_if = "std::ops::Not::not")]
    pub is_seed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterViewMeta {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatacenterViewSpec {
    #[serde(default)]
    pub seed: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    /// Provider name, empty for seed entries
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
    #[serde(default)]
    pub node: NodeSettings,
    #[serde(flatten)]
    pub spec: DatacenterSpec,
}

impl DatacenterView {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Body of a datacenter creation call
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatacenterRequest {
    pub name: String,
    pub spec: DatacenterViewSpec,
}
