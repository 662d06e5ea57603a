use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::provider::{exactly_one, ProviderKind, UnionError};

/// A worker node request for a cluster
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    pub spec: NodeSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub cloud: NodeCloudSpec,
    pub operating_system: OperatingSystemSpec,
    #[serde(default)]
    pub versions: NodeVersionInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeVersionInfo {
    #[serde(default)]
    pub kubelet: String,
}

/// Provider-specific sizing of a worker node; exactly one field is set
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeCloudSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsNodeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureNodeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digitalocean: Option<DigitaloceanNodeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hetzner: Option<HetznerNodeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstack: Option<OpenstackNodeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsphere: Option<VSphereNodeSpec>,
}

/// Resolved node sizing
#[derive(Clone, Debug, PartialEq)]
pub enum NodeCloudProvider {
    Aws(AwsNodeSpec),
    Azure(AzureNodeSpec),
    Digitalocean(DigitaloceanNodeSpec),
    Hetzner(HetznerNodeSpec),
    Openstack(OpenstackNodeSpec),
    Vsphere(VSphereNodeSpec),
}

impl NodeCloudProvider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            NodeCloudProvider::Aws(_) => ProviderKind::Aws,
            NodeCloudProvider::Azure(_) => ProviderKind::Azure,
            NodeCloudProvider::Digitalocean(_) => ProviderKind::Digitalocean,
            NodeCloudProvider::Hetzner(_) => ProviderKind::Hetzner,
            NodeCloudProvider::Openstack(_) => ProviderKind::Openstack,
            NodeCloudProvider::Vsphere(_) => ProviderKind::Vsphere,
        }
    }
}

impl NodeCloudSpec {
    pub fn provider(&self) -> Result<NodeCloudProvider, UnionError> {
        exactly_one(
            "node cloud",
            vec![
                ("aws", self.aws.clone().map(NodeCloudProvider::Aws)),
                ("azure", self.azure.clone().map(NodeCloudProvider::Azure)),
                (
                    "digitalocean",
                    self.digitalocean.clone().map(NodeCloudProvider::Digitalocean),
                ),
                ("hetzner", self.hetzner.clone().map(NodeCloudProvider::Hetzner)),
                ("openstack", self.openstack.clone().map(NodeCloudProvider::Openstack)),
                ("vsphere", self.vsphere.clone().map(NodeCloudProvider::Vsphere)),
            ],
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwsNodeSpec {
    pub instance_type: String,
    pub volume_size: i32,
    pub volume_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ami: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AzureNodeSpec {
    pub size: String,
    #[serde(default)]
    pub assign_public_ip: bool,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DigitaloceanNodeSpec {
    pub size: String,
    #[serde(default)]
    pub backups: bool,
    #[serde(default)]
    pub ipv6: bool,
    #[serde(default)]
    pub monitoring: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HetznerNodeSpec {
    #[serde(rename = "type")]
    pub server_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OpenstackNodeSpec {
    pub flavor: String,
    pub image: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VSphereNodeSpec {
    pub cpus: i32,
    pub memory: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
}

/// OS bootstrap configuration of a worker node; exactly one field is set
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatingSystemSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ubuntu: Option<UbuntuSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centos: Option<CentOSSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_linux: Option<ContainerLinuxSpec>,
}

/// Resolved OS bootstrap configuration
#[derive(Clone, Debug, PartialEq)]
pub enum OperatingSystem {
    Ubuntu(UbuntuSpec),
    CentOS(CentOSSpec),
    ContainerLinux(ContainerLinuxSpec),
}

impl OperatingSystem {
    /// Name understood by the machine-controller
    pub fn name(&self) -> &'static str {
        match self {
            OperatingSystem::Ubuntu(_) => "ubuntu",
            OperatingSystem::CentOS(_) => "centos",
            OperatingSystem::ContainerLinux(_) => "coreos",
        }
    }
}

impl OperatingSystemSpec {
    pub fn operating_system(&self) -> Result<OperatingSystem, UnionError> {
        exactly_one(
            "operating system",
            vec![
                ("centos", self.centos.clone().map(OperatingSystem::CentOS)),
                (
                    "containerLinux",
                    self.container_linux.clone().map(OperatingSystem::ContainerLinux),
                ),
                ("ubuntu", self.ubuntu.clone().map(OperatingSystem::Ubuntu)),
            ],
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UbuntuSpec {
    #[serde(default)]
    pub dist_upgrade_on_boot: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CentOSSpec {
    #[serde(default)]
    pub dist_upgrade_on_boot: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerLinuxSpec {
    #[serde(default)]
    pub disable_auto_update: bool,
}
