//! Cloud provider configuration handed to the apiserver and controller-manager

use crate::merge;
use crate::names::*;
use crate::pod;
use crate::template::TemplateData;
use k8s_openapi::api::core::v1::{ConfigMap, Volume, VolumeMount};
use kplane_api::v1::{CloudProvider, DatacenterProvider};
use kplane_api::ProviderKind;
use kplane_core::{ConfigurationError, CoreError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write;

const CLOUD_CONFIG_MOUNT_PATH: &str = "/etc/kubernetes/cloud";

/// Cloud config config map, identical content for every component reading it
pub fn config_map(data: &TemplateData, existing: Option<&ConfigMap>) -> Result<ConfigMap> {
    let config = render(data)?;
    let labels = pod::app_labels(data, CLOUD_CONFIG_CONFIG_MAP_NAME);
    Ok(ConfigMap {
        metadata: merge::object_meta(
            data,
            CLOUD_CONFIG_CONFIG_MAP_NAME,
            labels,
            existing.map(|c| &c.metadata),
        ),
        data: Some(BTreeMap::from([(CLOUD_CONFIG_KEY.to_string(), config)])),
        ..Default::default()
    })
}

/// Render the provider configuration; empty for providers without an in-tree
/// cloud provider
pub fn render(data: &TemplateData) -> Result<String> {
    let cloud = data.cloud_provider()?;
    if !cloud.kind().has_in_tree_cloud_provider() {
        return Ok(String::new());
    }
    let datacenter = data.datacenter_provider()?;

    match (cloud, datacenter) {
        (CloudProvider::Aws(aws), DatacenterProvider::Aws(dc)) => {
            let zone = if aws.availability_zone.is_empty() {
                format!("{}{}", dc.region, dc.zone_character)
            } else {
                aws.availability_zone.clone()
            };
            Ok(ini(&[(
                "global",
                vec![
                    ("Zone", zone),
                    ("VPC", aws.vpc_id),
                    ("SubnetID", aws.subnet_id),
                    ("RouteTableID", aws.route_table_id),
                    ("RoleARN", aws.role_name),
                    ("KubernetesClusterTag", data.cluster_name().to_string()),
                    ("DisableSecurityGroupIngress", "false".to_string()),
                    ("ElbSecurityGroup", aws.security_group_id),
                ],
            )]))
        }
        (CloudProvider::Azure(azure), DatacenterProvider::Azure(dc)) => {
            let config = AzureCloudConfig {
                cloud: "AZUREPUBLICCLOUD",
                tenant_id: azure.tenant_id,
                subscription_id: azure.subscription_id,
                aad_client_id: azure.client_id,
                aad_client_secret: azure.client_secret,
                resource_group: azure.resource_group,
                location: dc.location,
                vnet_name: azure.vnet_name,
                subnet_name: azure.subnet_name,
                route_table_name: azure.route_table_name,
                security_group_name: azure.security_group,
                use_instance_metadata: true,
            };
            Ok(serde_json::to_string_pretty(&config)?)
        }
        (CloudProvider::Openstack(os), DatacenterProvider::Openstack(dc)) => Ok(ini(&[
            (
                "Global",
                vec![
                    ("auth-url", dc.auth_url),
                    ("username", os.username),
                    ("password", os.password),
                    ("domain-name", os.domain),
                    ("tenant-name", os.tenant),
                    ("region", dc.region),
                ],
            ),
            (
                "BlockStorage",
                vec![
                    ("trust-device-path", "false".to_string()),
                    ("bs-version", "auto".to_string()),
                    ("ignore-volume-az", dc.ignore_volume_az.to_string()),
                ],
            ),
            (
                "LoadBalancer",
                vec![("manage-security-groups", "true".to_string())],
            ),
        ])),
        (CloudProvider::Vsphere(vsphere), DatacenterProvider::Vsphere(dc)) => {
            let server = vsphere_host(&dc.endpoint)?;
            let folder = if dc.root_path.is_empty() {
                data.cluster_name().to_string()
            } else {
                format!("{}/{}", dc.root_path, data.cluster_name())
            };
            Ok(ini(&[
                (
                    "Global",
                    vec![
                        ("user", vsphere.username),
                        ("password", vsphere.password),
                        ("server", server.clone()),
                        ("port", "443".to_string()),
                        ("insecure-flag", dc.allow_insecure.to_string()),
                        ("working-dir", data.cluster_name().to_string()),
                        ("datacenter", dc.datacenter.clone()),
                        ("datastore", dc.datastore.clone()),
                    ],
                ),
                ("Disk", vec![("scsicontrollertype", "pvscsi".to_string())]),
                (
                    "Workspace",
                    vec![
                        ("server", server),
                        ("datacenter", dc.datacenter),
                        ("folder", folder),
                        ("default-datastore", dc.datastore),
                        ("resourcepool-path", format!("{}/Resources", dc.cluster)),
                    ],
                ),
            ]))
        }
        (cloud, datacenter) => Err(CoreError::from(ConfigurationError::ProviderMismatch {
            subject: "datacenter",
            expected: cloud.kind(),
            found: datacenter.kind(),
        })),
    }
}

/// Kind of in-tree cloud provider the control plane integrates with, if any
pub fn in_tree_provider(data: &TemplateData) -> Result<Option<ProviderKind>> {
    let kind = data.provider_kind()?;
    Ok(kind.has_in_tree_cloud_provider().then_some(kind))
}

/// Flags, volumes and pod annotations wiring a component to the cloud config
#[derive(Default)]
pub struct CloudConfigWiring {
    pub flags: Vec<String>,
    pub volumes: Vec<Volume>,
    pub mounts: Vec<VolumeMount>,
    pub annotations: BTreeMap<String, String>,
}

pub fn wiring(data: &TemplateData) -> Result<CloudConfigWiring> {
    let Some(kind) = in_tree_provider(data)? else {
        return Ok(CloudConfigWiring::default());
    };

    let mut annotations = pod::revision_annotations(data, &[], &[CLOUD_CONFIG_CONFIG_MAP_NAME])?;
    annotations.insert(
        CLOUD_CONFIG_CHECKSUM_ANNOTATION.to_string(),
        checksum(&render(data)?),
    );

    Ok(CloudConfigWiring {
        flags: vec![
            format!("--cloud-provider={}", kind),
            format!("--cloud-config={}/{}", CLOUD_CONFIG_MOUNT_PATH, CLOUD_CONFIG_KEY),
        ],
        volumes: vec![pod::config_map_volume(CLOUD_CONFIG_CONFIG_MAP_NAME)],
        mounts: vec![pod::mount(CLOUD_CONFIG_CONFIG_MAP_NAME, CLOUD_CONFIG_MOUNT_PATH)],
        annotations,
    })
}

/// Hex encoded sha256 of a rendered config
pub fn checksum(config: &str) -> String {
    hex::encode(Sha256::digest(config.as_bytes()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AzureCloudConfig {
    cloud: &'static str,
    tenant_id: String,
    subscription_id: String,
    aad_client_id: String,
    aad_client_secret: String,
    resource_group: String,
    location: String,
    vnet_name: String,
    subnet_name: String,
    route_table_name: String,
    security_group_name: String,
    use_instance_metadata: bool,
}

fn ini(sections: &[(&str, Vec<(&str, String)>)]) -> String {
    let mut out = String::new();
    for (index, (section, entries)) in sections.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "[{}]", section);
        for (key, value) in entries {
            let _ = writeln!(out, "{} = {:?}", key, value);
        }
    }
    out
}

fn vsphere_host(endpoint: &str) -> Result<String> {
    let host = endpoint
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    if host.is_empty() {
        return Err(ConfigurationError::Invalid(format!(
            "vsphere endpoint {:?} has no host",
            endpoint
        ))
        .into());
    }
    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_openstack_config() {
        let data = testing::template_data(testing::openstack_cloud(), "1.9.0");
        let config = render(&data).unwrap();
        assert!(config.starts_with("[Global]\n"));
        assert!(config.contains("auth-url = \"https://example.com:8000/v3\"\n"));
        assert!(config.contains("tenant-name = \"openstack-tenant\"\n"));
        assert!(config.contains("ignore-volume-az = \"true\"\n"));
    }

    #[test]
    fn test_aws_config_uses_cluster_zone() {
        let data = testing::template_data(testing::aws_cloud(), "1.9.0");
        let config = render(&data).unwrap();
        assert!(config.contains("Zone = \"aws-availability-zone\"\n"));
        assert!(config.contains("KubernetesClusterTag = \"de-test-01\"\n"));
    }

    #[test]
    fn test_azure_config_is_json() {
        let data = testing::template_data(testing::azure_cloud(), "1.9.0");
        let config: serde_json::Value = serde_json::from_str(&render(&data).unwrap()).unwrap();
        assert_eq!(config["location"], "westeurope");
        assert_eq!(config["aadClientId"], "32hrf23oh89f32");
    }

    #[test]
    fn test_vsphere_config_extracts_host() {
        let data = testing::template_data(testing::vsphere_cloud(), "1.9.0");
        let config = render(&data).unwrap();
        assert!(config.contains("server = \"vsphere.local\"\n"));
        assert!(config.contains("folder = \"/vsphere-datacenter/vm/kplane/de-test-01\"\n"));
    }

    #[test]
    fn test_providers_without_cloud_integration_render_empty() {
        for cloud in [testing::digitalocean_cloud(), testing::bringyourown_cloud()] {
            let data = testing::template_data(cloud, "1.9.0");
            assert_eq!(render(&data).unwrap(), "");
            assert!(wiring(&data).unwrap().flags.is_empty());
        }
    }

    #[test]
    fn test_wiring_annotates_checksum_and_revision() {
        let data = testing::template_data(testing::aws_cloud(), "1.9.0");
        let wiring = wiring(&data).unwrap();
        assert_eq!(wiring.flags[0], "--cloud-provider=aws");
        assert_eq!(wiring.annotations["cloud-config-configmap-revision"], "123456");
        assert_eq!(
            wiring.annotations[CLOUD_CONFIG_CHECKSUM_ANNOTATION],
            checksum(&render(&data).unwrap())
        );
        assert_eq!(wiring.annotations[CLOUD_CONFIG_CHECKSUM_ANNOTATION].len(), 64);
    }
}
