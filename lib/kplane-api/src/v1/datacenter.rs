use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::provider::{exactly_one, ProviderKind, UnionError};

/// A named deployment target owned by a Seed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Datacenter {
    #[serde(default)]
    pub country: String,

    #[serde(default)]
    pub location: String,

    /// Settings applied to every worker node created in this datacenter
    #[serde(default)]
    pub node: NodeSettings,

    pub spec: DatacenterSpec,
}

/// Provider binding and access restrictions of a datacenter
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatacenterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<DatacenterSpecAws>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<DatacenterSpecAzure>,

    #[serde(rename = "bringyourown", default, skip_serializing_if = "Option::is_none")]
    pub bring_your_own: Option<DatacenterSpecBringYourOwn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digitalocean: Option<DatacenterSpecDigitalocean>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fake: Option<DatacenterSpecFake>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hetzner: Option<DatacenterSpecHetzner>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstack: Option<DatacenterSpecOpenstack>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsphere: Option<DatacenterSpecVSphere>,

    /// Only users with an email in this domain may use the datacenter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_email_domain: Option<String>,

    /// Like `requiredEmailDomain`, matching any of the listed domains
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_email_domains: Vec<String>,

    #[serde(default)]
    pub enforce_audit_logging: bool,

    #[serde(default)]
    pub enforce_pod_security_policy: bool,
}

/// Resolved provider binding of a datacenter
#[derive(Clone, Debug, PartialEq)]
pub enum DatacenterProvider {
    Aws(DatacenterSpecAws),
    Azure(DatacenterSpecAzure),
    BringYourOwn(DatacenterSpecBringYourOwn),
    Digitalocean(DatacenterSpecDigitalocean),
    Fake(DatacenterSpecFake),
    Hetzner(DatacenterSpecHetzner),
    Openstack(DatacenterSpecOpenstack),
    Vsphere(DatacenterSpecVSphere),
}

impl DatacenterProvider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            DatacenterProvider::Aws(_) => ProviderKind::Aws,
            DatacenterProvider::Azure(_) => ProviderKind::Azure,
            DatacenterProvider::BringYourOwn(_) => ProviderKind::BringYourOwn,
            DatacenterProvider::Digitalocean(_) => ProviderKind::Digitalocean,
            DatacenterProvider::Fake(_) => ProviderKind::Fake,
            DatacenterProvider::Hetzner(_) => ProviderKind::Hetzner,
            DatacenterProvider::Openstack(_) => ProviderKind::Openstack,
            DatacenterProvider::Vsphere(_) => ProviderKind::Vsphere,
        }
    }
}

impl DatacenterSpec {
    /// Resolve the single populated provider
    pub fn provider(&self) -> Result<DatacenterProvider, UnionError> {
        exactly_one(
            "DC",
            vec![
                ("aws", self.aws.clone().map(DatacenterProvider::Aws)),
                ("azure", self.azure.clone().map(DatacenterProvider::Azure)),
                (
                    "bringyourown",
                    self.bring_your_own.clone().map(DatacenterProvider::BringYourOwn),
                ),
                (
                    "digitalocean",
                    self.digitalocean.clone().map(DatacenterProvider::Digitalocean),
                ),
                ("fake", self.fake.clone().map(DatacenterProvider::Fake)),
                ("hetzner", self.hetzner.clone().map(DatacenterProvider::Hetzner)),
                ("openstack", self.openstack.clone().map(DatacenterProvider::Openstack)),
                ("vsphere", self.vsphere.clone().map(DatacenterProvider::Vsphere)),
            ],
        )
    }

    /// Build a spec bound to `provider` with no access restrictions
    pub fn from_provider(provider: DatacenterProvider) -> Self {
        let mut spec = DatacenterSpec::default();
        match provider {
            DatacenterProvider::Aws(p) => spec.aws = Some(p),
            DatacenterProvider::Azure(p) => spec.azure = Some(p),
            DatacenterProvider::BringYourOwn(p) => spec.bring_your_own = Some(p),
            DatacenterProvider::Digitalocean(p) => spec.digitalocean = Some(p),
            DatacenterProvider::Fake(p) => spec.fake = Some(p),
            DatacenterProvider::Hetzner(p) => spec.hetzner = Some(p),
            DatacenterProvider::Openstack(p) => spec.openstack = Some(p),
            DatacenterProvider::Vsphere(p) => spec.vsphere = Some(p),
        }
        spec
    }

    /// All email domains that restrict access, both the single and list form
    pub fn required_email_domains(&self) -> Vec<&str> {
        self.required_email_domain
            .iter()
            .chain(self.required_email_domains.iter())
            .map(String::as_str)
            .filter(|domain| !domain.is_empty())
            .collect()
    }
}

/// Settings for worker nodes of a datacenter.
///
/// Field names stay snake_case on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insecure_registries: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperkube_image: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatacenterSpecAws {
    pub region: String,
    /// Default AMI for worker nodes
    #[serde(default)]
    pub ami: String,
    /// Zone suffix appended to the region, e.g. "a" for eu-central-1a
    #[serde(default)]
    pub zone_character: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DatacenterSpecAzure {
    pub location: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DatacenterSpecBringYourOwn {}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DatacenterSpecDigitalocean {
    #[serde(default)]
    pub region: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DatacenterSpecFake {
    #[serde(default)]
    pub fake_property: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DatacenterSpecHetzner {
    #[serde(default)]
    pub datacenter: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatacenterSpecOpenstack {
    pub auth_url: String,
    #[serde(default)]
    pub availability_zone: String,
    pub region: String,
    #[serde(default)]
    pub dns_servers: Vec<String>,
    #[serde(default)]
    pub ignore_volume_az: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatacenterSpecVSphere {
    pub endpoint: String,
    #[serde(default)]
    pub allow_insecure: bool,
    pub datastore: String,
    pub datacenter: String,
    pub cluster: String,
    #[serde(default)]
    pub root_path: String,
}
