//! Provider identifiers and the exactly-one rule shared by every provider union

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Cloud providers known to the platform
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Aws,
    Azure,
    BringYourOwn,
    Digitalocean,
    Fake,
    Hetzner,
    Openstack,
    Vsphere,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 8] = [
        ProviderKind::Aws,
        ProviderKind::Azure,
        ProviderKind::BringYourOwn,
        ProviderKind::Digitalocean,
        ProviderKind::Fake,
        ProviderKind::Hetzner,
        ProviderKind::Openstack,
        ProviderKind::Vsphere,
    ];

    /// Wire name of the provider, identical to its union field name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Aws => "aws",
            ProviderKind::Azure => "azure",
            ProviderKind::BringYourOwn => "bringyourown",
            ProviderKind::Digitalocean => "digitalocean",
            ProviderKind::Fake => "fake",
            ProviderKind::Hetzner => "hetzner",
            ProviderKind::Openstack => "openstack",
            ProviderKind::Vsphere => "vsphere",
        }
    }

    /// Whether the in-tree Kubernetes cloud provider is wired into the
    /// control plane (`--cloud-provider` / `--cloud-config`)
    pub fn has_in_tree_cloud_provider(&self) -> bool {
        matches!(
            self,
            ProviderKind::Aws | ProviderKind::Azure | ProviderKind::Openstack | ProviderKind::Vsphere
        )
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider {0:?}")]
pub struct UnknownProvider(pub String);

/// A provider union had zero or several variants populated.
///
/// `set` lists the populated field names in sorted order so the message is
/// stable no matter in which order the fields were declared or filled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("one {union} provider should be specified, got: [{}]", .set.join(" "))]
pub struct UnionError {
    pub union: &'static str,
    pub set: Vec<&'static str>,
}

/// Resolve a union from its `(field name, value)` candidates.
///
/// Returns the single populated value, or a [`UnionError`] naming every
/// populated field when the count is not exactly one.
pub fn exactly_one<T>(
    union: &'static str,
    candidates: Vec<(&'static str, Option<T>)>,
) -> Result<T, UnionError> {
    let mut set = Vec::new();
    let mut chosen = Vec::new();
    for (field, value) in candidates {
        if let Some(value) = value {
            set.push(field);
            chosen.push(value);
        }
    }

    match (chosen.pop(), chosen.is_empty()) {
        (Some(value), true) => Ok(value),
        _ => {
            set.sort_unstable();
            Err(UnionError { union, set })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_picks_single_value() {
        let value = exactly_one("cloud", vec![("aws", None), ("azure", Some(2)), ("fake", None)]);
        assert_eq!(value, Ok(2));
    }

    #[test]
    fn test_exactly_one_rejects_empty_union() {
        let err = exactly_one::<u8>("DC", vec![("aws", None), ("azure", None)]).unwrap_err();
        assert!(err.set.is_empty());
        assert_eq!(err.to_string(), "one DC provider should be specified, got: []");
    }

    #[test]
    fn test_exactly_one_sorts_offending_fields() {
        let err = exactly_one("DC", vec![("azure", Some(1)), ("aws", Some(2))]).unwrap_err();
        assert_eq!(err.set, vec!["aws", "azure"]);
        assert_eq!(
            err.to_string(),
            "one DC provider should be specified, got: [aws azure]"
        );
    }

    #[test]
    fn test_provider_kind_round_trips_names() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>(), Ok(kind));
        }
        assert!("gce".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ProviderKind::BringYourOwn).unwrap();
        assert_eq!(json, "\"bringyourown\"");
    }
}
