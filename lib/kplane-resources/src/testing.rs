//! Sample clusters, datacenters and snapshots shared by unit tests and the
//! golden fixture suite

use crate::names::*;
use crate::template::{TemplateData, TemplateOptions};
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kplane_api::v1::cloud::{
    AwsCloudSpec, AzureCloudSpec, BringYourOwnCloudSpec, DigitaloceanCloudSpec, HetznerCloudSpec,
    OpenstackCloudSpec, VSphereCloudSpec,
};
use kplane_api::v1::datacenter::{
    DatacenterSpecAws, DatacenterSpecAzure, DatacenterSpecBringYourOwn, DatacenterSpecDigitalocean,
    DatacenterSpecFake, DatacenterSpecHetzner, DatacenterSpecOpenstack, DatacenterSpecVSphere,
};
use kplane_api::v1::{
    CloudProvider, CloudSpec, Cluster, ClusterAddress, ClusterNetworkingConfig, ClusterSpec,
    ClusterStatus, Datacenter, DatacenterProvider, DatacenterSpec, NetworkRanges,
};
use kplane_api::ProviderKind;
use kplane_core::{Listers, SnapshotStore};
use std::sync::Arc;

pub const CLUSTER_NAME: &str = "de-test-01";
pub const CLUSTER_NAMESPACE: &str = "cluster-de-test-01";
pub const SNAPSHOT_REVISION: &str = "123456";
pub const EXTERNAL_NODE_PORT: i32 = 30000;

/// Secrets every control plane namespace holds before its deployments are rendered
pub const SNAPSHOT_SECRETS: [&str; 7] = [
    TOKENS_SECRET_NAME,
    SERVICE_ACCOUNT_KEY_SECRET_NAME,
    CA_CERT_SECRET_NAME,
    CA_KEY_SECRET_NAME,
    APISERVER_TLS_SECRET_NAME,
    KUBELET_CLIENT_CERTIFICATES_SECRET_NAME,
    OPENVPN_SERVER_CERTIFICATES_SECRET_NAME,
];

pub fn cluster(cloud: CloudSpec, version: &str) -> Cluster {
    let mut cluster = Cluster::new(
        CLUSTER_NAME,
        ClusterSpec {
            cloud,
            version: version.to_string(),
            cluster_network: ClusterNetworkingConfig {
                services: NetworkRanges {
                    cidr_blocks: vec!["10.10.10.0/24".to_string()],
                },
                pods: NetworkRanges {
                    cidr_blocks: vec!["172.25.0.0/16".to_string()],
                },
                dns_domain: "cluster.local".to_string(),
            },
            ..Default::default()
        },
    );
    cluster.metadata.uid = Some("1234567890".to_string());
    cluster.status = Some(ClusterStatus {
        namespace_name: CLUSTER_NAMESPACE.to_string(),
        address: ClusterAddress {
            external_name: "jh8j81chn.europe-west3-c.dev.kplane.io".to_string(),
            ip: "35.198.93.90".to_string(),
            admin_token: "6hzr76.u8txpkk4vhgmtgdp".to_string(),
        },
    });
    cluster
}

pub fn aws_cloud() -> CloudSpec {
    CloudSpec::from_provider(
        "aws-us-central1a",
        CloudProvider::Aws(AwsCloudSpec {
            access_key_id: "aws-access-key-id".to_string(),
            secret_access_key: "aws-secret-access-key".to_string(),
            vpc_id: "aws-vpn-id".to_string(),
            subnet_id: "aws-subnet-id".to_string(),
            route_table_id: "aws-route-table-id".to_string(),
            instance_profile_name: "aws-instance-profile-name".to_string(),
            role_name: "aws-role-name".to_string(),
            security_group_id: "aws-security-group".to_string(),
            availability_zone: "aws-availability-zone".to_string(),
        }),
    )
}

pub fn azure_cloud() -> CloudSpec {
    CloudSpec::from_provider(
        "azure-westeurope",
        CloudProvider::Azure(AzureCloudSpec {
            tenant_id: "38w7giefb32fhifw3q".to_string(),
            subscription_id: "32h9q8r8xqp3h9".to_string(),
            client_id: "32hrf23oh89f32".to_string(),
            client_secret: "rbyughv438oh32f23v2".to_string(),
            resource_group: "cluster-de-test-01".to_string(),
            vnet_name: "cluster-de-test-01".to_string(),
            subnet_name: "cluster-de-test-01".to_string(),
            route_table_name: "cluster-de-test-01".to_string(),
            security_group: "cluster-de-test-01".to_string(),
        }),
    )
}

pub fn bringyourown_cloud() -> CloudSpec {
    CloudSpec::from_provider(
        "byo-kubernetes",
        CloudProvider::BringYourOwn(BringYourOwnCloudSpec {}),
    )
}

pub fn digitalocean_cloud() -> CloudSpec {
    CloudSpec::from_provider(
        "do-fra1",
        CloudProvider::Digitalocean(DigitaloceanCloudSpec {
            token: "do-token".to_string(),
        }),
    )
}

pub fn hetzner_cloud() -> CloudSpec {
    CloudSpec::from_provider(
        "hetzner-fsn1",
        CloudProvider::Hetzner(HetznerCloudSpec {
            token: "hetzner-token".to_string(),
        }),
    )
}

pub fn openstack_cloud() -> CloudSpec {
    CloudSpec::from_provider(
        "syseleven-dbl1",
        CloudProvider::Openstack(OpenstackCloudSpec {
            username: "openstack-username".to_string(),
            password: "openstack-password".to_string(),
            tenant: "openstack-tenant".to_string(),
            domain: "openstack-domain".to_string(),
            network: "openstack-network".to_string(),
            security_groups: "openstack-security-group1,openstack-security-group2".to_string(),
            floating_ip_pool: "openstack-floating-ip-pool".to_string(),
            router_id: "openstack-router-id".to_string(),
            subnet_id: "openstack-subnet-id".to_string(),
        }),
    )
}

pub fn vsphere_cloud() -> CloudSpec {
    CloudSpec::from_provider(
        "vsphere-dummy",
        CloudProvider::Vsphere(VSphereCloudSpec {
            username: "vsphere-username".to_string(),
            password: "vsphere-password".to_string(),
            vm_net_name: "vsphere-network".to_string(),
        }),
    )
}

/// A datacenter bound to `kind` with representative provider metadata
pub fn datacenter_for(kind: ProviderKind) -> Datacenter {
    let provider = match kind {
        ProviderKind::Aws => DatacenterProvider::Aws(DatacenterSpecAws {
            region: "us-central1".to_string(),
            ami: "ami-aujakj".to_string(),
            zone_character: "a".to_string(),
        }),
        ProviderKind::Azure => DatacenterProvider::Azure(DatacenterSpecAzure {
            location: "westeurope".to_string(),
        }),
        ProviderKind::BringYourOwn => DatacenterProvider::BringYourOwn(DatacenterSpecBringYourOwn {}),
        ProviderKind::Digitalocean => DatacenterProvider::Digitalocean(DatacenterSpecDigitalocean {
            region: "fra1".to_string(),
        }),
        ProviderKind::Fake => DatacenterProvider::Fake(DatacenterSpecFake::default()),
        ProviderKind::Hetzner => DatacenterProvider::Hetzner(DatacenterSpecHetzner {
            datacenter: "hetzner-datacenter".to_string(),
            location: "hetzner-location".to_string(),
        }),
        ProviderKind::Openstack => DatacenterProvider::Openstack(DatacenterSpecOpenstack {
            auth_url: "https://example.com:8000/v3".to_string(),
            availability_zone: "zone1".to_string(),
            region: "cbk".to_string(),
            dns_servers: vec!["8.8.8.8".to_string(), "8.8.4.4".to_string()],
            ignore_volume_az: true,
        }),
        ProviderKind::Vsphere => DatacenterProvider::Vsphere(DatacenterSpecVSphere {
            endpoint: "https://vsphere.local".to_string(),
            allow_insecure: true,
            datastore: "vsphere-datastore".to_string(),
            datacenter: "vsphere-datacenter".to_string(),
            cluster: "vsphere-cluster".to_string(),
            root_path: "/vsphere-datacenter/vm/kplane".to_string(),
        }),
    };
    Datacenter {
        country: "DE".to_string(),
        location: "Frankfurt".to_string(),
        spec: DatacenterSpec::from_provider(provider),
        ..Default::default()
    }
}

fn meta(name: &str, resource_version: Option<&str>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(CLUSTER_NAMESPACE.to_string()),
        resource_version: resource_version.map(str::to_string),
        ..Default::default()
    }
}

/// Snapshot of the control plane namespace right before rendering
pub fn listers() -> Listers {
    let secrets = SnapshotStore::from_objects(SNAPSHOT_SECRETS.iter().map(|name| Secret {
        metadata: meta(name, Some(SNAPSHOT_REVISION)),
        ..Default::default()
    }));
    let config_maps = SnapshotStore::from_objects([ConfigMap {
        metadata: meta(CLOUD_CONFIG_CONFIG_MAP_NAME, Some(SNAPSHOT_REVISION)),
        ..Default::default()
    }]);
    let services = SnapshotStore::from_objects([Service {
        metadata: meta(APISERVER_EXTERNAL_SERVICE_NAME, None),
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                port: 443,
                node_port: Some(EXTERNAL_NODE_PORT),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }]);
    Listers::new(Arc::new(secrets), Arc::new(config_maps), Arc::new(services))
}

pub fn empty_listers() -> Listers {
    Listers::new(
        Arc::new(SnapshotStore::<Secret>::new()),
        Arc::new(SnapshotStore::<ConfigMap>::new()),
        Arc::new(SnapshotStore::<Service>::new()),
    )
}

/// Template data for `cloud` in a datacenter of the same provider
pub fn template_data(cloud: CloudSpec, version: &str) -> TemplateData {
    template_data_with_listers(cloud, version, listers())
}

pub fn template_data_with_listers(cloud: CloudSpec, version: &str, listers: Listers) -> TemplateData {
    let datacenter = match cloud.provider() {
        Ok(provider) => datacenter_for(provider.kind()),
        Err(_) => Datacenter::default(),
    };
    TemplateData::new(
        cluster(cloud, version),
        datacenter,
        listers,
        TemplateOptions::default(),
    )
}
