use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::provider::{exactly_one, ProviderKind, UnionError};

/// Cloud credentials and placement of a cluster.
///
/// Exactly one provider field must be populated; use [`CloudSpec::provider`]
/// to obtain the resolved variant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloudSpec {
    /// Name of the datacenter the cluster runs in
    #[serde(rename = "dc", default)]
    pub datacenter_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsCloudSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureCloudSpec>,

    #[serde(rename = "bringyourown", default, skip_serializing_if = "Option::is_none")]
    pub bring_your_own: Option<BringYourOwnCloudSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digitalocean: Option<DigitaloceanCloudSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fake: Option<FakeCloudSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hetzner: Option<HetznerCloudSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstack: Option<OpenstackCloudSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsphere: Option<VSphereCloudSpec>,
}

/// Resolved cloud credentials of a cluster
#[derive(Clone, Debug, PartialEq)]
pub enum CloudProvider {
    Aws(AwsCloudSpec),
    Azure(AzureCloudSpec),
    BringYourOwn(BringYourOwnCloudSpec),
    Digitalocean(DigitaloceanCloudSpec),
    Fake(FakeCloudSpec),
    Hetzner(HetznerCloudSpec),
    Openstack(OpenstackCloudSpec),
    Vsphere(VSphereCloudSpec),
}

impl CloudProvider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            CloudProvider::Aws(_) => ProviderKind::Aws,
            CloudProvider::Azure(_) => ProviderKind::Azure,
            CloudProvider::BringYourOwn(_) => ProviderKind::BringYourOwn,
            CloudProvider::Digitalocean(_) => ProviderKind::Digitalocean,
            CloudProvider::Fake(_) => ProviderKind::Fake,
            CloudProvider::Hetzner(_) => ProviderKind::Hetzner,
            CloudProvider::Openstack(_) => ProviderKind::Openstack,
            CloudProvider::Vsphere(_) => ProviderKind::Vsphere,
        }
    }
}

impl CloudSpec {
    /// Resolve the single populated provider
    pub fn provider(&self) -> Result<CloudProvider, UnionError> {
        exactly_one(
            "cloud",
            vec![
                ("aws", self.aws.clone().map(CloudProvider::Aws)),
                ("azure", self.azure.clone().map(CloudProvider::Azure)),
                (
                    "bringyourown",
                    self.bring_your_own.clone().map(CloudProvider::BringYourOwn),
                ),
                (
                    "digitalocean",
                    self.digitalocean.clone().map(CloudProvider::Digitalocean),
                ),
                ("fake", self.fake.clone().map(CloudProvider::Fake)),
                ("hetzner", self.hetzner.clone().map(CloudProvider::Hetzner)),
                ("openstack", self.openstack.clone().map(CloudProvider::Openstack)),
                ("vsphere", self.vsphere.clone().map(CloudProvider::Vsphere)),
            ],
        )
    }

    /// Build a spec with exactly one provider populated
    pub fn from_provider(datacenter_name: impl Into<String>, provider: CloudProvider) -> Self {
        let mut spec = CloudSpec {
            datacenter_name: datacenter_name.into(),
            ..Default::default()
        };
        match provider {
            CloudProvider::Aws(p) => spec.aws = Some(p),
            CloudProvider::Azure(p) => spec.azure = Some(p),
            CloudProvider::BringYourOwn(p) => spec.bring_your_own = Some(p),
            CloudProvider::Digitalocean(p) => spec.digitalocean = Some(p),
            CloudProvider::Fake(p) => spec.fake = Some(p),
            CloudProvider::Hetzner(p) => spec.hetzner = Some(p),
            CloudProvider::Openstack(p) => spec.openstack = Some(p),
            CloudProvider::Vsphere(p) => spec.vsphere = Some(p),
        }
        spec
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwsCloudSpec {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub vpc_id: String,
    #[serde(default)]
    pub subnet_id: String,
    #[serde(default)]
    pub route_table_id: String,
    #[serde(default)]
    pub instance_profile_name: String,
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub security_group_id: String,
    #[serde(default)]
    pub availability_zone: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AzureCloudSpec {
    pub tenant_id: String,
    pub subscription_id: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub resource_group: String,
    #[serde(default)]
    pub vnet_name: String,
    #[serde(default)]
    pub subnet_name: String,
    #[serde(default)]
    pub route_table_name: String,
    #[serde(default)]
    pub security_group: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BringYourOwnCloudSpec {}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DigitaloceanCloudSpec {
    pub token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FakeCloudSpec {
    #[serde(default)]
    pub token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HetznerCloudSpec {
    pub token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenstackCloudSpec {
    pub username: String,
    pub password: String,
    pub tenant: String,
    pub domain: String,
    #[serde(default)]
    pub network: String,
    /// Comma separated list of security group names
    #[serde(default)]
    pub security_groups: String,
    #[serde(default)]
    pub floating_ip_pool: String,
    #[serde(default)]
    pub router_id: String,
    #[serde(default)]
    pub subnet_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VSphereCloudSpec {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub vm_net_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_resolves_single_variant() {
        let spec = CloudSpec::from_provider(
            "do-fra1",
            CloudProvider::Digitalocean(DigitaloceanCloudSpec {
                token: "do-token".to_string(),
            }),
        );
        let provider = spec.provider().expect("one provider is set");
        assert_eq!(provider.kind(), ProviderKind::Digitalocean);
    }

    #[test]
    fn test_provider_rejects_multiple_variants() {
        let spec = CloudSpec {
            datacenter_name: "dc".to_string(),
            openstack: Some(OpenstackCloudSpec::default()),
            aws: Some(AwsCloudSpec::default()),
            ..Default::default()
        };
        let err = spec.provider().unwrap_err();
        assert_eq!(err.set, vec!["aws", "openstack"]);
    }

    #[test]
    fn test_wire_format_uses_provider_field_names() {
        let json = serde_json::json!({
            "dc": "byo-dc",
            "bringyourown": {}
        });
        let spec: CloudSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.datacenter_name, "byo-dc");
        assert_eq!(spec.provider().unwrap().kind(), ProviderKind::BringYourOwn);
    }
}
