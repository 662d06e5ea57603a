//! Everything a resource creator may read about the cluster it renders

use crate::names::APISERVER_EXTERNAL_SERVICE_NAME;
use ipnetwork::Ipv4Network;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kplane_api::v1::{CloudProvider, Cluster, Datacenter, DatacenterProvider};
use kplane_api::ProviderKind;
use kplane_core::{ConfigurationError, CoreError, KubernetesVersion, Listers, Result};
use std::net::Ipv4Addr;

const DEFAULT_NODE_PORT_RANGE: &str = "30000-32767";
const DEFAULT_ETCD_DISK_SIZE: &str = "5Gi";

/// Settings of the platform installation rather than of one cluster
#[derive(Clone, Debug)]
pub struct TemplateOptions {
    /// Registry replacing every upstream registry when set
    pub overwrite_registry: Option<String>,
    pub node_port_range: String,
    pub etcd_disk_size: Quantity,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            overwrite_registry: None,
            node_port_range: DEFAULT_NODE_PORT_RANGE.to_string(),
            etcd_disk_size: Quantity(DEFAULT_ETCD_DISK_SIZE.to_string()),
        }
    }
}

/// Immutable input of every resource creator.
///
/// Derived values are computed on access so that a broken field only fails
/// the objects that actually read it.
pub struct TemplateData {
    cluster: Cluster,
    datacenter: Datacenter,
    listers: Listers,
    options: TemplateOptions,
}

impl TemplateData {
    pub fn new(
        cluster: Cluster,
        datacenter: Datacenter,
        listers: Listers,
        options: TemplateOptions,
    ) -> Self {
        Self {
            cluster,
            datacenter,
            listers,
            options,
        }
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn datacenter(&self) -> &Datacenter {
        &self.datacenter
    }

    pub fn cluster_name(&self) -> &str {
        self.cluster.cluster_name()
    }

    /// Namespace holding the control plane
    pub fn namespace(&self) -> String {
        self.cluster.namespace_name()
    }

    pub fn kubernetes_version(&self) -> Result<KubernetesVersion> {
        Ok(self.cluster.spec.version.parse::<KubernetesVersion>()?)
    }

    pub fn cloud_provider(&self) -> Result<CloudProvider> {
        Ok(self.cluster.spec.cloud.provider()?)
    }

    pub fn provider_kind(&self) -> Result<ProviderKind> {
        Ok(self.cloud_provider()?.kind())
    }

    /// Provider metadata of the datacenter; it must match the cluster's provider
    pub fn datacenter_provider(&self) -> Result<DatacenterProvider> {
        let provider =
            self.datacenter
                .spec
                .provider()
                .map_err(|source| ConfigurationError::Datacenter {
                    datacenter: self.cluster.datacenter_name().to_string(),
                    source,
                })?;
        let expected = self.provider_kind()?;
        if provider.kind() != expected {
            return Err(ConfigurationError::ProviderMismatch {
                subject: "datacenter",
                expected,
                found: provider.kind(),
            }
            .into());
        }
        Ok(provider)
    }

    /// Node port of the externally exposed apiserver, read from its service
    pub fn external_node_port(&self) -> Result<i32> {
        let namespace = self.namespace();
        let service = self
            .listers
            .service(&namespace, APISERVER_EXTERNAL_SERVICE_NAME)?;
        service
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_ref())
            .and_then(|ports| ports.first())
            .and_then(|port| port.node_port)
            .ok_or_else(|| {
                ConfigurationError::Invalid(format!(
                    "service {}/{} has no node port allocated",
                    namespace, APISERVER_EXTERNAL_SERVICE_NAME
                ))
                .into()
            })
    }

    pub fn service_network(&self) -> Result<Ipv4Network> {
        first_network(&self.cluster.spec.cluster_network.services.cidr_blocks, "service")
    }

    pub fn pod_network(&self) -> Result<Ipv4Network> {
        first_network(&self.cluster.spec.cluster_network.pods.cidr_blocks, "pod")
    }

    /// Tenth address of the service network
    pub fn dns_cluster_ip(&self) -> Result<Ipv4Addr> {
        nth_address(self.service_network()?, 10)
    }

    /// First address of the service network
    pub fn apiserver_cluster_ip(&self) -> Result<Ipv4Addr> {
        nth_address(self.service_network()?, 1)
    }

    pub fn dns_domain(&self) -> &str {
        match self.cluster.spec.cluster_network.dns_domain.as_str() {
            "" => "cluster.local",
            domain => domain,
        }
    }

    pub fn etcd_disk_size(&self) -> &Quantity {
        &self.options.etcd_disk_size
    }

    pub fn node_port_range(&self) -> &str {
        &self.options.node_port_range
    }

    /// Image reference with the registry replaced when an override is configured
    pub fn image(&self, registry: &str, repository: &str) -> String {
        let registry = self.options.overwrite_registry.as_deref().unwrap_or(registry);
        format!("{}/{}", registry, repository)
    }

    pub fn audit_logging(&self) -> bool {
        self.cluster.spec.audit_logging || self.datacenter.spec.enforce_audit_logging
    }

    pub fn pod_security_policy(&self) -> bool {
        self.cluster.spec.use_pod_security_policy || self.datacenter.spec.enforce_pod_security_policy
    }

    /// resourceVersion of a secret in the control plane namespace
    pub fn secret_revision(&self, name: &str) -> Result<String> {
        let secret = self.listers.secret(&self.namespace(), name)?;
        Ok(secret.metadata.resource_version.clone().unwrap_or_default())
    }

    /// resourceVersion of a config map in the control plane namespace
    pub fn config_map_revision(&self, name: &str) -> Result<String> {
        let config_map = self.listers.config_map(&self.namespace(), name)?;
        Ok(config_map.metadata.resource_version.clone().unwrap_or_default())
    }
}

fn first_network(blocks: &[String], purpose: &str) -> Result<Ipv4Network> {
    let cidr = blocks.first().ok_or_else(|| {
        CoreError::from(ConfigurationError::Invalid(format!(
            "cluster has no {} network configured",
            purpose
        )))
    })?;
    cidr.parse::<Ipv4Network>().map_err(|err| {
        ConfigurationError::InvalidCidr {
            cidr: cidr.clone(),
            reason: err.to_string(),
        }
        .into()
    })
}

fn nth_address(network: Ipv4Network, n: u32) -> Result<Ipv4Addr> {
    network.nth(n).ok_or_else(|| {
        ConfigurationError::InvalidCidr {
            cidr: network.to_string(),
            reason: format!("network has no address at offset {}", n),
        }
        .into()
    })
}
