use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::datacenter::Datacenter;

/// Seed is a region-level grouping that owns a set of datacenters.
///
/// Datacenter names are unique across all seeds, not only within one.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "kplane.io",
    version = "v1",
    kind = "Seed",
    plural = "seeds",
    namespaced,
    derive = "Default",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Country","type":"string","jsonPath":".spec.country"}"#,
    printcolumn = r#"{"name":"Location","type":"string","jsonPath":".spec.location"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SeedSpec {
    #[serde(default)]
    pub country: String,

    #[serde(default)]
    pub location: String,

    /// Datacenters keyed by their globally unique name
    #[serde(default)]
    pub datacenters: BTreeMap<String, Datacenter>,
}

impl Seed {
    /// Name of the seed, empty when unset
    pub fn seed_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// A seed without a name and without datacenters
    pub fn is_empty(&self) -> bool {
        self.seed_name().is_empty() && self.spec.datacenters.is_empty()
    }

    pub fn has_datacenter(&self, name: &str) -> bool {
        self.spec.datacenters.contains_key(name)
    }

    pub fn datacenter_names(&self) -> impl Iterator<Item = &str> {
        self.spec.datacenters.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v1::datacenter::{DatacenterSpec, DatacenterSpecFake};

    #[test]
    fn test_default_seed_is_empty() {
        assert!(Seed::default().is_empty());
    }

    #[test]
    fn test_named_seed_is_not_empty() {
        let seed = Seed::new("europe-west3-c", SeedSpec::default());
        assert!(!seed.is_empty());
        assert_eq!(seed.seed_name(), "europe-west3-c");
    }

    #[test]
    fn test_datacenter_names_are_sorted() {
        let mut spec = SeedSpec::default();
        for name in ["dc2", "dc1"] {
            spec.datacenters.insert(
                name.to_string(),
                Datacenter {
                    spec: DatacenterSpec {
                        fake: Some(DatacenterSpecFake::default()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            );
        }
        let seed = Seed::new("seed", spec);
        assert!(seed.has_datacenter("dc1"));
        assert_eq!(seed.datacenter_names().collect::<Vec<_>>(), vec!["dc1", "dc2"]);
    }
}
