//! Worker node manifests for the machine-controller
//!
//! A Machine embeds the node's sizing verbatim and adds the credentials of the
//! cluster and the placement of its datacenter. Credentials are only ever read
//! from the cluster.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kplane_api::v1::{
    CloudProvider, Cluster, Datacenter, DatacenterProvider, MachineSpec, MachineVersionInfo,
    Node, NodeCloudProvider, OperatingSystem, ProviderConfig,
};
use kplane_api::{Machine, UserSshKey};
use kplane_core::{ConfigurationError, CoreError, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Namespace the machine-controller watches inside the user cluster
pub const MACHINE_NAMESPACE: &str = "kube-system";

pub fn compile(
    cluster: &Cluster,
    node: &Node,
    datacenter: &Datacenter,
    ssh_keys: &[UserSshKey],
) -> Result<Machine> {
    let sizing = node.spec.cloud.provider()?;
    let placement = datacenter.spec.provider()?;
    let credentials = cluster.spec.cloud.provider()?;

    if placement.kind() != sizing.kind() {
        return Err(mismatch("datacenter", sizing.kind(), placement.kind()));
    }
    if credentials.kind() != sizing.kind() {
        return Err(mismatch("cluster", sizing.kind(), credentials.kind()));
    }

    let os = node.spec.operating_system.operating_system()?;
    let kind = sizing.kind();
    let cloud_provider_spec = provider_spec(cluster, sizing, placement, credentials)?;

    let ssh_public_keys: Vec<String> = ssh_keys
        .iter()
        .filter(|key| key.is_authorized_for(cluster.cluster_name()))
        .map(|key| key.public_key().to_string())
        .collect();

    debug!(
        cluster = %cluster.cluster_name(),
        node = %node.name,
        provider = %kind,
        keys = ssh_public_keys.len(),
        "Compiled machine"
    );

    Ok(Machine {
        metadata: ObjectMeta {
            name: Some(node.name.clone()),
            namespace: Some(MACHINE_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: MachineSpec {
            provider_config: ProviderConfig {
                cloud_provider: kind,
                cloud_provider_spec,
                operating_system: os.name().to_string(),
                operating_system_spec: os_spec(&os)?,
                ssh_public_keys,
            },
            versions: MachineVersionInfo {
                kubelet: node.spec.versions.kubelet.clone(),
            },
        },
    })
}

fn mismatch(
    subject: &'static str,
    expected: kplane_api::ProviderKind,
    found: kplane_api::ProviderKind,
) -> CoreError {
    ConfigurationError::ProviderMismatch {
        subject,
        expected,
        found,
    }
    .into()
}

fn provider_spec(
    cluster: &Cluster,
    sizing: NodeCloudProvider,
    placement: DatacenterProvider,
    credentials: CloudProvider,
) -> Result<Value> {
    let envelope = match (sizing, placement, credentials) {
        (NodeCloudProvider::Aws(node), DatacenterProvider::Aws(dc), CloudProvider::Aws(aws)) => {
            let mut tags = node.tags.clone();
            tags.insert("KubernetesCluster".to_string(), cluster.cluster_name().to_string());
            let ami = if node.ami.is_empty() { dc.ami.clone() } else { node.ami.clone() };
            let mut spec = flatten(&node)?;
            spec.extend(object(json!({
                "accessKeyId": aws.access_key_id,
                "secretAccessKey": aws.secret_access_key,
                "region": dc.region,
                "availabilityZone": format!("{}{}", dc.region, dc.zone_character),
                "vpcId": aws.vpc_id,
                "subnetId": aws.subnet_id,
                "securityGroupIDs": [aws.security_group_id],
                "instanceProfile": aws.instance_profile_name,
                "ami": ami,
                "tags": tags,
            })));
            spec
        }
        (
            NodeCloudProvider::Azure(node),
            DatacenterProvider::Azure(dc),
            CloudProvider::Azure(azure),
        ) => {
            let mut spec = flatten(&node)?;
            spec.extend(object(json!({
                "tenantID": azure.tenant_id,
                "subscriptionID": azure.subscription_id,
                "clientID": azure.client_id,
                "clientSecret": azure.client_secret,
                "location": dc.location,
                "resourceGroup": azure.resource_group,
                "vnetName": azure.vnet_name,
                "subnetName": azure.subnet_name,
                "routeTableName": azure.route_table_name,
                "securityGroupName": azure.security_group,
            })));
            spec
        }
        (
            NodeCloudProvider::Digitalocean(node),
            DatacenterProvider::Digitalocean(dc),
            CloudProvider::Digitalocean(digitalocean),
        ) => {
            let mut spec = flatten(&node)?;
            spec.extend(object(json!({
                "token": digitalocean.token,
                "region": dc.region,
            })));
            spec
        }
        (
            NodeCloudProvider::Hetzner(node),
            DatacenterProvider::Hetzner(dc),
            CloudProvider::Hetzner(hetzner),
        ) => {
            let mut spec = flatten(&node)?;
            spec.extend(object(json!({
                "token": hetzner.token,
                "datacenter": dc.datacenter,
                "location": dc.location,
            })));
            spec
        }
        (
            NodeCloudProvider::Openstack(node),
            DatacenterProvider::Openstack(dc),
            CloudProvider::Openstack(os),
        ) => {
            let security_groups: Vec<&str> = os
                .security_groups
                .split(',')
                .map(str::trim)
                .filter(|group| !group.is_empty())
                .collect();
            let mut spec = flatten(&node)?;
            spec.extend(object(json!({
                "identityEndpoint": dc.auth_url,
                "availabilityZone": dc.availability_zone,
                "region": dc.region,
                "username": os.username,
                "password": os.password,
                "domainName": os.domain,
                "tenantName": os.tenant,
                "network": os.network,
                "securityGroups": security_groups,
                "floatingIpPool": os.floating_ip_pool,
            })));
            spec
        }
        (
            NodeCloudProvider::Vsphere(node),
            DatacenterProvider::Vsphere(dc),
            CloudProvider::Vsphere(vsphere),
        ) => {
            let mut spec = flatten(&node)?;
            spec.extend(object(json!({
                "username": vsphere.username,
                "password": vsphere.password,
                "vsphereURL": dc.endpoint,
                "allowInsecure": dc.allow_insecure,
                "datacenter": dc.datacenter,
                "cluster": dc.cluster,
                "datastore": dc.datastore,
                "folder": dc.root_path,
                "vmNetName": vsphere.vm_net_name,
            })));
            spec
        }
        (sizing, _, _) => {
            return Err(ConfigurationError::Invalid(format!(
                "worker nodes are not supported on {}",
                sizing.kind()
            ))
            .into())
        }
    };
    Ok(Value::Object(envelope))
}

fn os_spec(os: &OperatingSystem) -> Result<Value> {
    Ok(match os {
        OperatingSystem::Ubuntu(spec) => serde_json::to_value(spec)?,
        OperatingSystem::CentOS(spec) => serde_json::to_value(spec)?,
        OperatingSystem::ContainerLinux(spec) => serde_json::to_value(spec)?,
    })
}

/// Node payload as a JSON object so credentials can be layered on top
fn flatten<T: Serialize>(payload: &T) -> Result<Map<String, Value>> {
    Ok(object(serde_json::to_value(payload)?))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use kplane_api::v1::node::{
        AwsNodeSpec, ContainerLinuxSpec, DigitaloceanNodeSpec, NodeCloudSpec, OperatingSystemSpec,
        UbuntuSpec,
    };
    use kplane_api::v1::{NodeSpec, NodeVersionInfo, UserSshKeySpec};
    use kplane_api::ProviderKind;

    fn key(name: &str, clusters: &[&str]) -> UserSshKey {
        UserSshKey::new(
            name,
            UserSshKeySpec {
                owner: "John Doe".to_string(),
                name: name.to_string(),
                fingerprint: "1234:56789:1234:56789".to_string(),
                public_key: format!("ssh-rsa {}", name),
                clusters: clusters.iter().map(|c| c.to_string()).collect(),
            },
        )
    }

    fn do_node() -> Node {
        Node {
            name: "de-test-01-te5s7".to_string(),
            spec: NodeSpec {
                cloud: NodeCloudSpec {
                    digitalocean: Some(DigitaloceanNodeSpec {
                        size: "s-1vcpu-1gb".to_string(),
                        monitoring: true,
                        tags: vec!["tag-1".to_string()],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                operating_system: OperatingSystemSpec {
                    ubuntu: Some(UbuntuSpec::default()),
                    ..Default::default()
                },
                versions: NodeVersionInfo {
                    kubelet: "v1.9.6".to_string(),
                },
            },
        }
    }

    #[test]
    fn test_compile_digitalocean_machine() {
        let cluster = testing::cluster(testing::digitalocean_cloud(), "1.9.0");
        let keys = [key("mine", &[testing::CLUSTER_NAME]), key("other", &["other-cluster"])];
        let machine = compile(
            &cluster,
            &do_node(),
            &testing::datacenter_for(ProviderKind::Digitalocean),
            &keys,
        )
        .unwrap();

        let config = &machine.spec.provider_config;
        assert_eq!(config.cloud_provider, ProviderKind::Digitalocean);
        assert_eq!(config.operating_system, "ubuntu");
        assert_eq!(config.ssh_public_keys, vec!["ssh-rsa mine"]);
        assert_eq!(config.cloud_provider_spec["token"], "do-token");
        assert_eq!(config.cloud_provider_spec["region"], "fra1");
        assert_eq!(config.cloud_provider_spec["size"], "s-1vcpu-1gb");
        assert_eq!(config.cloud_provider_spec["monitoring"], true);
        assert_eq!(machine.spec.versions.kubelet, "v1.9.6");
    }

    #[test]
    fn test_no_authorized_keys_is_valid() {
        let cluster = testing::cluster(testing::digitalocean_cloud(), "1.9.0");
        let machine = compile(
            &cluster,
            &do_node(),
            &testing::datacenter_for(ProviderKind::Digitalocean),
            &[],
        )
        .unwrap();
        assert!(machine.spec.provider_config.ssh_public_keys.is_empty());
    }

    #[test]
    fn test_datacenter_provider_mismatch_is_rejected() {
        let cluster = testing::cluster(testing::digitalocean_cloud(), "1.9.0");
        let err = compile(
            &cluster,
            &do_node(),
            &testing::datacenter_for(ProviderKind::Aws),
            &[],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Configuration(ConfigurationError::ProviderMismatch { subject: "datacenter", .. })
        ));
    }

    #[test]
    fn test_cluster_provider_mismatch_is_rejected() {
        let cluster = testing::cluster(testing::aws_cloud(), "1.9.0");
        let err = compile(
            &cluster,
            &do_node(),
            &testing::datacenter_for(ProviderKind::Digitalocean),
            &[],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Configuration(ConfigurationError::ProviderMismatch { subject: "cluster", .. })
        ));
    }

    #[test]
    fn test_aws_defaults_ami_from_datacenter() {
        let cluster = testing::cluster(testing::aws_cloud(), "1.9.0");
        let mut node = do_node();
        node.spec.cloud = NodeCloudSpec {
            aws: Some(AwsNodeSpec {
                instance_type: "t2.micro".to_string(),
                volume_size: 25,
                volume_type: "standard".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        node.spec.operating_system = OperatingSystemSpec {
            container_linux: Some(ContainerLinuxSpec {
                disable_auto_update: true,
            }),
            ..Default::default()
        };

        let machine =
            compile(&cluster, &node, &testing::datacenter_for(ProviderKind::Aws), &[]).unwrap();
        let config = &machine.spec.provider_config;
        assert_eq!(config.cloud_provider_spec["ami"], "ami-aujakj");
        assert_eq!(config.cloud_provider_spec["accessKeyId"], "aws-access-key-id");
        assert_eq!(config.cloud_provider_spec["tags"]["KubernetesCluster"], "de-test-01");
        assert_eq!(config.operating_system, "coreos");
        assert_eq!(config.operating_system_spec["disableAutoUpdate"], true);
    }

    #[test]
    fn test_operating_system_must_be_exclusive() {
        let cluster = testing::cluster(testing::digitalocean_cloud(), "1.9.0");
        let mut node = do_node();
        node.spec.operating_system.centos = Some(Default::default());
        assert!(compile(
            &cluster,
            &node,
            &testing::datacenter_for(ProviderKind::Digitalocean),
            &[]
        )
        .is_err());
    }
}
